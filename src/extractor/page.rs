use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::MAX_PRIZE_TIERS;
use crate::error::{AppError, Result};
use crate::extractor::amount::parse_currency;
use crate::extractor::timestamp::parse_site_datetime;
use crate::types::{PrizeSnapshot, PrizeTier};

const JACKPOT_INFO: &str = "div.fp-progressive-jackpot-info";
const JACKPOT_DATETIME: &str = "span.fp-progressive-jackpot-datetime";
const GAME_HEADING: &str = "#fp-detail h3";
const PRIZE_TABLE: &str = "table.table-global";

/// Pull the full snapshot out of a game page.
/// `now` stands in for the observation time when the page carries no usable stamp.
pub fn extract_snapshot(html: &str, now: NaiveDateTime) -> Result<PrizeSnapshot> {
    let doc = Html::parse_document(html);

    let info = jackpot_info(&doc)?;
    let prize_amount = prize_from_info(info)?;
    let game_name = game_name(&doc)?;

    let observed_at = match first_text(info, JACKPOT_DATETIME)? {
        Some(stamp) => match parse_site_datetime(&stamp) {
            Some(t) => t,
            None => {
                warn!("Could not parse site timestamp {stamp:?}, using local clock");
                now
            }
        },
        None => {
            warn!("Site timestamp not found, using local clock");
            now
        }
    };

    let tiers = prize_tiers(&doc)?;
    debug!(game = %game_name, prize = %prize_amount, tiers = tiers.len(), "page extracted");

    Ok(PrizeSnapshot {
        game_name,
        prize_amount,
        observed_at,
        tiers,
    })
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::parse(format!("bad selector {css:?}: {e}")))
}

fn jackpot_info(doc: &Html) -> Result<ElementRef<'_>> {
    doc.select(&selector(JACKPOT_INFO)?)
        .next()
        .ok_or_else(|| AppError::parse(format!("{JACKPOT_INFO} not found; page layout changed?")))
}

fn prize_from_info(info: ElementRef<'_>) -> Result<Decimal> {
    let text = first_text(info, "strong")?
        .ok_or_else(|| AppError::parse(format!("no <strong> inside {JACKPOT_INFO}")))?;
    parse_currency(&text)
}

/// `#fp-detail h3`, else the `<title>` segment after the last dash, else the first `<h3>`.
fn game_name(doc: &Html) -> Result<String> {
    let root = doc.root_element();

    let name = match first_text(root, GAME_HEADING)? {
        Some(name) => Some(name),
        None => match first_text(root, "title")? {
            Some(title) => title.rsplit('-').next().map(|s| s.trim().to_string()),
            None => first_text(root, "h3")?,
        },
    };

    name.filter(|n| !n.is_empty())
        .map(|n| n.to_uppercase())
        .ok_or_else(|| AppError::parse("game name not found"))
}

fn prize_tiers(doc: &Html) -> Result<Vec<PrizeTier>> {
    let Some(table) = doc.select(&selector(PRIZE_TABLE)?).next() else {
        debug!("{PRIZE_TABLE} not found, no tiers recorded");
        return Ok(Vec::new());
    };

    let row_sel = selector("tbody tr")?;
    let cell_sel = selector("td")?;

    Ok(table
        .select(&row_sel)
        .take(MAX_PRIZE_TIERS)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&cell_sel).map(element_text).collect();
            match cells.as_slice() {
                [value, remaining, ..] => Some(PrizeTier {
                    value: value.clone(),
                    remaining: remaining.clone(),
                }),
                _ => None,
            }
        })
        .collect())
}

/// Trimmed text of the first match under `scope`, None if nothing matches.
fn first_text(scope: ElementRef<'_>, css: &str) -> Result<Option<String>> {
    let sel = selector(css)?;
    Ok(scope.select(&sel).next().map(element_text))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
