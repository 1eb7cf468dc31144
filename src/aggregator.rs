use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::classifier::{classify, select_winning_number};
use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::matcher::validate_numbers;
use crate::period::{is_valid_period_key, parse_timestamp, resolve_period};
use crate::types::{SummaryStatistics, Ticket, TicketResult, WinningNumber};

/// Order of `Aggregation::results`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultOrder {
    /// Same order as the input tickets.
    #[default]
    Input,
    /// Newest purchase first; tickets without a readable date go last.
    PurchaseDateDesc,
}

impl FromStr for ResultOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" => Ok(ResultOrder::Input),
            "purchase-date-desc" | "newest" => Ok(ResultOrder::PurchaseDateDesc),
            other => Err(format!("unknown result order: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub results: Vec<TicketResult>,
    pub summary: SummaryStatistics,
    /// Excluded records and data warnings, in discovery order.
    pub issues: Vec<MatchError>,
}

impl Aggregation {
    pub fn errors(&self) -> impl Iterator<Item = &MatchError> {
        self.issues.iter().filter(|issue| !issue.is_warning())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &MatchError> {
        self.issues.iter().filter(|issue| issue.is_warning())
    }
}

/// Matches every ticket against the winning numbers and rolls up statistics.
///
/// Records with malformed numbers are left out of results and statistics and
/// reported in `issues`. A ticket whose period resolves to a malformed
/// winning number is excluded the same way, exactly as [`classify`] fails for
/// it. This is a full recomputation over the given snapshot and has no side
/// effects, so calling it twice yields the same output.
pub fn aggregate(
    tickets: &[Ticket],
    winning_numbers: &[WinningNumber],
    config: &MatchConfig,
) -> Aggregation {
    let mut issues = Vec::new();
    let active = active_winning_numbers(winning_numbers, config, &mut issues);

    let mut evaluated: Vec<(&Ticket, TicketResult)> = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        let period = resolve_period(ticket.purchase_date.as_deref(), config.granularity());
        let candidates: &[WinningNumber] = period
            .as_deref()
            .and_then(|p| active.get(p))
            .map(|w| std::slice::from_ref(*w))
            .unwrap_or(&[]);

        match classify(ticket, candidates, config) {
            Ok(result) => {
                if period.is_none() {
                    debug!("ticket {} has unreadable purchase date {:?}", ticket.id, ticket.purchase_date);
                    issues.push(MatchError::UnresolvedPeriod {
                        ticket_id: ticket.id.clone(),
                    });
                }
                evaluated.push((ticket, result));
            }
            Err(e) => {
                warn!("excluding ticket {}: {}", ticket.id, e);
                issues.push(exclusion_for(ticket, e));
            }
        }
    }

    if config.order() == ResultOrder::PurchaseDateDesc {
        // Stable sort: equal dates keep input order. `None` sorts below any date.
        evaluated.sort_by(|(a, _), (b, _)| {
            let a = a.purchase_date.as_deref().and_then(parse_timestamp);
            let b = b.purchase_date.as_deref().and_then(parse_timestamp);
            b.cmp(&a)
        });
    }

    let results: Vec<TicketResult> = evaluated.into_iter().map(|(_, result)| result).collect();
    let summary = summarize(&results);

    Aggregation {
        results,
        summary,
        issues,
    }
}

// Names the excluded ticket when the failure came from its winning number.
fn exclusion_for(ticket: &Ticket, error: MatchError) -> MatchError {
    match error {
        MatchError::InvalidFormat { id, reason } if id != ticket.id => MatchError::InvalidFormat {
            id: ticket.id.clone(),
            reason: format!("winning number {} is malformed: {}", id, reason),
        },
        other => other,
    }
}

// Picks one winning number per period, reporting duplicates and malformed
// records. Malformed numbers still take part in the tie-break.
fn active_winning_numbers<'a>(
    winning_numbers: &'a [WinningNumber],
    config: &MatchConfig,
    issues: &mut Vec<MatchError>,
) -> HashMap<&'a str, &'a WinningNumber> {
    let mut by_period: BTreeMap<&str, Vec<&WinningNumber>> = BTreeMap::new();

    for winning in winning_numbers {
        if let Err(e) = validate_numbers(&winning.id, &winning.numbers, config.number_length()) {
            warn!("winning number {} is malformed: {}", winning.id, e);
            issues.push(e);
        }
        if !is_valid_period_key(&winning.period, config.granularity()) {
            warn!("winning number {} has period {:?} that no ticket can resolve to", winning.id, winning.period);
            issues.push(MatchError::MalformedPeriod {
                id: winning.id.clone(),
                period: winning.period.clone(),
            });
        }
        by_period.entry(winning.period.as_str()).or_default().push(winning);
    }

    let mut active = HashMap::with_capacity(by_period.len());
    for (period, candidates) in by_period {
        let Some(chosen) = select_winning_number(candidates.iter().copied()) else {
            continue;
        };
        if candidates.len() > 1 {
            warn!("🎰 {} winning numbers for period {}, using {}", candidates.len(), period, chosen.id);
            issues.push(MatchError::AmbiguousWinningNumber {
                period: period.to_string(),
                candidates: candidates.iter().map(|w| w.id.clone()).collect(),
                chosen: chosen.id.clone(),
            });
        }
        active.insert(period, chosen);
    }
    active
}

pub fn win_rate(winners: usize, tickets: usize) -> f64 {
    if tickets == 0 {
        0.0
    } else {
        winners as f64 / tickets as f64 * 100.0
    }
}

/// Rolls a set of results up into totals and per-period/per-source breakdowns.
pub fn summarize(results: &[TicketResult]) -> SummaryStatistics {
    let mut summary = SummaryStatistics::default();

    for result in results {
        summary.total_tickets += 1;

        let source = summary.by_source.entry(result.source).or_default();
        source.tickets += 1;

        if result.is_winner {
            summary.total_winners += 1;
            summary.total_prize += result.prize_amount;
            source.winners += 1;
        }
        if result.is_pending() {
            summary.pending_tickets += 1;
        }
        if result.is_near_miss() {
            summary.near_misses += 1;
        }

        if let Some(period) = &result.period {
            let stats = summary.by_period.entry(period.clone()).or_default();
            stats.tickets += 1;
            if result.is_winner {
                stats.winners += 1;
            }
            if result.is_pending() {
                stats.pending += 1;
            }
        }
    }

    summary.win_rate = win_rate(summary.total_winners, summary.total_tickets);
    for stats in summary.by_period.values_mut() {
        stats.win_rate = win_rate(stats.winners, stats.tickets);
    }

    summary
}
