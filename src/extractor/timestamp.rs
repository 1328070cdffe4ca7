use chrono::NaiveDateTime;

const WITH_SECONDS: &str = "%m/%d/%Y %I:%M:%S %p";
const WITHOUT_SECONDS: &str = "%m/%d/%Y %I:%M %p";

/// Parse the site's "As of 5/28/2025 1:29:54 PM" stamp (prefix optional).
/// Returns None when neither layout matches.
pub fn parse_site_datetime(text: &str) -> Option<NaiveDateTime> {
    let s = text.trim();
    let s = s.strip_prefix("As of ").unwrap_or(s).trim();

    NaiveDateTime::parse_from_str(s, WITH_SECONDS)
        .or_else(|_| NaiveDateTime::parse_from_str(s, WITHOUT_SECONDS))
        .ok()
}
