use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Decimal places kept on stored estimates.
const ESTIMATE_DP: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SalesEstimate {
    /// Tickets implied sold since the previous observation.
    pub tickets: Option<Decimal>,
    /// `tickets` scaled to one hour by the elapsed time.
    pub hourly: Option<Decimal>,
}

/// Previous observation fields the estimate depends on.
#[derive(Debug, Clone, Copy)]
pub struct PriorPoint {
    pub observed_at: NaiveDateTime,
    pub prize_amount: Decimal,
    pub ticket_contribution: Option<Decimal>,
}

/// Tickets implied by the prize pool shrinking from `previous` to `current`.
/// A pool that held or grew implies zero; sales are never negative.
/// None when the contribution is not positive or the quotient overflows.
pub fn implied_sales(previous: Decimal, current: Decimal, contribution: Decimal) -> Option<Decimal> {
    if contribution <= Decimal::ZERO {
        return None;
    }
    if current >= previous {
        return Some(Decimal::ZERO);
    }
    let tickets = previous.checked_sub(current)?.checked_div(contribution)?;
    Some(tickets.round_dp(ESTIMATE_DP))
}

/// `tickets` per hour over the elapsed span; None unless time moved forward
/// and the rate fits in a `Decimal`.
pub fn hourly_rate(tickets: Decimal, from: NaiveDateTime, to: NaiveDateTime) -> Option<Decimal> {
    let elapsed_secs = (to - from).num_seconds();
    if elapsed_secs <= 0 {
        return None;
    }
    let per_hour = tickets
        .checked_mul(Decimal::from(3600))?
        .checked_div(Decimal::from(elapsed_secs))?;
    Some(per_hour.round_dp(ESTIMATE_DP))
}

/// Full estimate for a new observation. The delta since `prior` is divided by
/// the contribution stored on `prior` (the one in effect when that row was
/// written); `configured_contribution` only fills in when `prior` has none.
pub fn estimate(
    prior: Option<PriorPoint>,
    current: Decimal,
    observed_at: NaiveDateTime,
    configured_contribution: Decimal,
) -> SalesEstimate {
    let Some(prior) = prior else {
        return SalesEstimate::default();
    };

    let contribution = prior.ticket_contribution.unwrap_or(configured_contribution);
    let tickets = implied_sales(prior.prize_amount, current, contribution);
    let hourly = tickets.and_then(|t| hourly_rate(t, prior.observed_at, observed_at));

    SalesEstimate { tickets, hourly }
}
