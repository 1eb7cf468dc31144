use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TicketSource {
    #[default]
    Manual,
    Sms,
    Api,
}

impl TicketSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketSource::Manual => "manual",
            TicketSource::Sms => "sms",
            TicketSource::Api => "api",
        }
    }
}

impl fmt::Display for TicketSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TicketSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(TicketSource::Manual),
            "sms" => Ok(TicketSource::Sms),
            "api" => Ok(TicketSource::Api),
            other => Err(format!("unknown ticket source: {}", other)),
        }
    }
}

/// A purchased ticket as supplied by the storage layer.
///
/// `purchase_date` is kept as the raw text that was stored, since a missing or
/// unreadable date must still yield a (pending) result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub numbers: String,
    #[serde(default, alias = "purchaseDate")]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub source: TicketSource,
}

pub fn default_prize_amount() -> Decimal {
    Decimal::from(10_000)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningNumber {
    pub id: String,
    pub numbers: String,
    #[serde(alias = "month")]
    pub period: String,
    #[serde(alias = "drawDate")]
    pub draw_date: DateTime<Utc>,
    #[serde(default = "default_prize_amount", alias = "prizeAmount")]
    pub prize_amount: Decimal,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Won,
    Lost,
    /// No winning number has been published for the ticket's period yet.
    Pending,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Won => "won",
            ResultStatus::Lost => "lost",
            ResultStatus::Pending => "pending",
        }
    }
}

impl FromStr for ResultStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "won" => Ok(ResultStatus::Won),
            "lost" => Ok(ResultStatus::Lost),
            "pending" => Ok(ResultStatus::Pending),
            other => Err(format!("unknown result status: {}", other)),
        }
    }
}

/// Coarse band of a match count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Full,
    High,
    Medium,
    Low,
    Pending,
}

impl MatchTier {
    /// Bands are 70% and 40% of the number length, i.e. 7 and 4 digits of 10.
    pub fn from_match_count(match_count: usize, number_length: usize) -> Self {
        if match_count >= number_length {
            MatchTier::Full
        } else if match_count * 10 >= number_length * 7 {
            MatchTier::High
        } else if match_count * 10 >= number_length * 4 {
            MatchTier::Medium
        } else {
            MatchTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Full => "full",
            MatchTier::High => "high",
            MatchTier::Medium => "medium",
            MatchTier::Low => "low",
            MatchTier::Pending => "pending",
        }
    }
}

impl FromStr for MatchTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(MatchTier::Full),
            "high" => Ok(MatchTier::High),
            "medium" => Ok(MatchTier::Medium),
            "low" => Ok(MatchTier::Low),
            "pending" => Ok(MatchTier::Pending),
            other => Err(format!("unknown match tier: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketResult {
    pub ticket_id: String,
    pub winning_number_id: Option<String>,
    pub period: Option<String>,
    pub source: TicketSource,
    pub match_count: usize,
    pub is_winner: bool,
    pub prize_amount: Decimal,
    pub status: ResultStatus,
    pub tier: MatchTier,
}

impl TicketResult {
    pub fn pending(ticket: &Ticket, period: Option<String>) -> Self {
        Self {
            ticket_id: ticket.id.clone(),
            winning_number_id: None,
            period,
            source: ticket.source,
            match_count: 0,
            is_winner: false,
            prize_amount: Decimal::ZERO,
            status: ResultStatus::Pending,
            tier: MatchTier::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ResultStatus::Pending
    }

    /// Evaluated, lost, but at least a medium match.
    pub fn is_near_miss(&self) -> bool {
        !self.is_winner && matches!(self.tier, MatchTier::High | MatchTier::Medium)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodStats {
    pub tickets: usize,
    pub winners: usize,
    pub pending: usize,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub tickets: usize,
    pub winners: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub total_tickets: usize,
    pub total_winners: usize,
    pub pending_tickets: usize,
    pub near_misses: usize,
    pub total_prize: Decimal,
    /// Percentage in `[0, 100]`, zero for an empty batch.
    pub win_rate: f64,
    pub by_period: BTreeMap<String, PeriodStats>,
    pub by_source: BTreeMap<TicketSource, SourceStats>,
}

impl SummaryStatistics {
    pub fn average_tickets_per_period(&self) -> f64 {
        if self.by_period.is_empty() {
            0.0
        } else {
            let in_periods: usize = self.by_period.values().map(|p| p.tickets).sum();
            in_periods as f64 / self.by_period.len() as f64
        }
    }
}
