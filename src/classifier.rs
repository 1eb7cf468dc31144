use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::matcher::{digit_match, validate_numbers};
use crate::period::resolve_period;
use crate::types::{MatchTier, ResultStatus, Ticket, TicketResult, WinningNumber};

/// Classifies one ticket against the winning numbers published for its period.
///
/// Candidates from other periods are ignored, so passing the full list of
/// winning numbers is fine. A ticket with no applicable winning number, or
/// whose purchase date cannot be read, comes back `Pending` rather than lost.
///
/// Duplicates for the period are resolved with [`select_winning_number`]
/// before any format check. If the selected number is malformed the ticket
/// fails with `InvalidFormat`; an older valid draw is never used instead.
/// Only [`aggregate`](crate::aggregator::aggregate) reports duplicates as
/// `AmbiguousWinningNumber`.
pub fn classify(
    ticket: &Ticket,
    candidates: &[WinningNumber],
    config: &MatchConfig,
) -> Result<TicketResult, MatchError> {
    let number_length = config.number_length();
    validate_numbers(&ticket.id, &ticket.numbers, number_length)?;

    let Some(period) = resolve_period(ticket.purchase_date.as_deref(), config.granularity()) else {
        return Ok(TicketResult::pending(ticket, None));
    };

    let applicable = candidates.iter().filter(|w| w.period == period);
    let Some(winning) = select_winning_number(applicable) else {
        return Ok(TicketResult::pending(ticket, Some(period)));
    };

    validate_numbers(&winning.id, &winning.numbers, number_length)?;
    let match_count = digit_match(&ticket.numbers, &winning.numbers, number_length)?;
    let is_winner = match_count == number_length;

    Ok(TicketResult {
        ticket_id: ticket.id.clone(),
        winning_number_id: Some(winning.id.clone()),
        period: Some(period),
        source: ticket.source,
        match_count,
        is_winner,
        prize_amount: if is_winner {
            winning.prize_amount
        } else {
            Decimal::ZERO
        },
        status: if is_winner {
            ResultStatus::Won
        } else {
            ResultStatus::Lost
        },
        tier: MatchTier::from_match_count(match_count, number_length),
    })
}

/// Picks the active winning number among duplicates for one period.
///
/// Latest `draw_date` wins, then latest `created_at` (a known creation time
/// beats none), then the greatest id.
pub fn select_winning_number<'a, I>(candidates: I) -> Option<&'a WinningNumber>
where
    I: IntoIterator<Item = &'a WinningNumber>,
{
    candidates.into_iter().max_by(|a, b| compare_recency(a, b))
}

fn compare_recency(a: &WinningNumber, b: &WinningNumber) -> Ordering {
    a.draw_date
        .cmp(&b.draw_date)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| compare_ids(&a.id, &b.id))
}

// Numeric ids compare as numbers so that "10" outranks "9".
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}
