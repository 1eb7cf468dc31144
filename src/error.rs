use thiserror::Error;

/// Problems found while matching tickets against winning numbers.
///
/// Only `InvalidFormat` and `InvalidConfig` are errors. The rest are warnings:
/// the batch still produces a result for the record involved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("invalid number format for {id}: {reason}")]
    InvalidFormat { id: String, reason: String },

    #[error("ticket {ticket_id} has no resolvable purchase date, marked pending")]
    UnresolvedPeriod { ticket_id: String },

    #[error(
        "{} winning numbers published for period {period}, using {chosen}",
        .candidates.len()
    )]
    AmbiguousWinningNumber {
        period: String,
        candidates: Vec<String>,
        chosen: String,
    },

    #[error("winning number {id} has malformed period key {period:?}")]
    MalformedPeriod { id: String, period: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MatchError {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            MatchError::UnresolvedPeriod { .. }
                | MatchError::AmbiguousWinningNumber { .. }
                | MatchError::MalformedPeriod { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_split() {
        let invalid = MatchError::InvalidFormat {
            id: "t1".to_string(),
            reason: "too short".to_string(),
        };
        let unresolved = MatchError::UnresolvedPeriod {
            ticket_id: "t2".to_string(),
        };
        assert!(!invalid.is_warning());
        assert!(unresolved.is_warning());
        assert!(!MatchError::InvalidConfig("zero".to_string()).is_warning());
    }

    #[test]
    fn test_ambiguous_message_counts_candidates() {
        let err = MatchError::AmbiguousWinningNumber {
            period: "2025-01".to_string(),
            candidates: vec!["1".to_string(), "2".to_string()],
            chosen: "2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "2 winning numbers published for period 2025-01, using 2"
        );
    }
}
