use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::types::{MatchTier, TicketResult};

/// Groups digits in pairs for display: `1234567890` -> `12 34 56 78 90`.
pub fn format_ticket_numbers(numbers: &str) -> String {
    let chars: Vec<char> = numbers.chars().collect();
    chars
        .chunks(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_prize_amount(amount: &Decimal) -> String {
    format!("${:.2}", amount)
}

/// `2025-01` -> `January 2025`. Other keys are returned unchanged.
pub fn format_period_label(period: &str) -> String {
    NaiveDate::parse_from_str(&format!("{}-01", period), "%Y-%m-%d")
        .map(|date| date.format("%B %Y").to_string())
        .unwrap_or_else(|_| period.to_string())
}

pub fn describe_result(result: &TicketResult) -> String {
    match result.tier {
        MatchTier::Pending => "pending".to_string(),
        MatchTier::Full => format!("WINNER! {}", format_prize_amount(&result.prize_amount)),
        _ => format!("{} matches ({})", result.match_count, result.tier.as_str()),
    }
}
