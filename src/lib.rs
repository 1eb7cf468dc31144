//! Ticket-to-drawing matching for a lottery ticket tracker.
//!
//! The engine (`matcher`, `period`, `classifier`, `aggregator`) is pure and
//! synchronous. `database`, `import` and `api` load and store the records it
//! works on.

pub mod aggregator;
pub mod api;
pub mod classifier;
pub mod config;
pub mod database;
pub mod error;
pub mod import;
pub mod matcher;
pub mod period;
pub mod types;
pub mod utils;

pub use aggregator::{Aggregation, ResultOrder, aggregate, summarize, win_rate};
pub use classifier::{classify, select_winning_number};
pub use config::{Config, MatchConfig};
pub use error::MatchError;
pub use matcher::{digit_match, validate_numbers};
pub use period::{PeriodGranularity, parse_timestamp, period_key, resolve_period};
pub use types::*;
