use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{info, warn};

use crate::database::{insert_winning_number, winning_number_exists};
use crate::matcher::validate_numbers;
use crate::types::WinningNumber;

/// Body returned by the winning-numbers endpoint: a bare array, or the
/// `{ "success": .., "data": [..] }` envelope.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum WinningNumbersPayload {
    List(Vec<WinningNumber>),
    Envelope { data: Vec<WinningNumber> },
}

pub fn parse_winning_numbers(body: &str) -> Result<Vec<WinningNumber>> {
    let payload: WinningNumbersPayload =
        serde_json::from_str(body).context("Unexpected winning numbers payload")?;
    Ok(match payload {
        WinningNumbersPayload::List(list) => list,
        WinningNumbersPayload::Envelope { data } => data,
    })
}

pub async fn fetch_winning_numbers(url: &str) -> Result<Vec<WinningNumber>> {
    let client = reqwest::Client::new();

    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?
        .error_for_status()?;

    let body = response.text().await?;
    parse_winning_numbers(&body)
}

/// Partitions fetched numbers into ones to store and ids already present.
pub fn check_existing_ids(
    conn: &Connection,
    fetched: Vec<WinningNumber>,
) -> Result<(Vec<WinningNumber>, Vec<String>)> {
    let mut to_save = Vec::new();
    let mut existing = Vec::new();

    for winning in fetched {
        if winning_number_exists(conn, &winning.id)? {
            existing.push(winning.id);
        } else {
            to_save.push(winning);
        }
    }

    Ok((to_save, existing))
}

/// Stores the new, well-formed numbers from `fetched` and returns them.
pub fn save_new_winning_numbers(
    conn: &Connection,
    fetched: Vec<WinningNumber>,
    number_length: usize,
) -> Result<Vec<WinningNumber>> {
    let (to_save, existing) = check_existing_ids(conn, fetched)?;

    if !existing.is_empty() {
        info!("📋 {} winning numbers already stored", existing.len());
    }

    let mut saved = Vec::new();
    for winning in to_save {
        if let Err(e) = validate_numbers(&winning.id, &winning.numbers, number_length) {
            warn!("✗ Rejected winning number: {}", e);
            continue;
        }
        insert_winning_number(conn, &winning)?;
        info!("✓ Saved winning number {} for period {}", winning.id, winning.period);
        saved.push(winning);
    }

    Ok(saved)
}

pub async fn fetch_and_save_winning_numbers(
    conn: &Connection,
    url: &str,
    number_length: usize,
) -> Result<Vec<WinningNumber>> {
    info!("🔍 Fetching winning numbers from {}", url);
    let fetched = fetch_winning_numbers(url).await?;
    info!("📥 Received {} winning numbers", fetched.len());

    let saved = save_new_winning_numbers(conn, fetched, number_length)?;
    if saved.is_empty() {
        info!("🎯 Nothing new to save");
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_tables, get_all_winning_numbers};

    const LIST_BODY: &str = r#"[
        {"id":"1","numbers":"1234567890","drawDate":"2025-01-15T00:00:00.000Z","month":"2025-01"},
        {"id":"2","numbers":"12ab","drawDate":"2025-02-15T00:00:00.000Z","month":"2025-02"}
    ]"#;

    #[test]
    fn test_parse_bare_list() {
        let parsed = parse_winning_numbers(LIST_BODY).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].period, "2025-01");
    }

    #[test]
    fn test_parse_envelope() {
        let body = r#"{"success":true,"data":[{"id":"9","numbers":"1234567890","drawDate":"2025-03-01T00:00:00Z","period":"2025-03","prizeAmount":"2500.00"}]}"#;
        let parsed = parse_winning_numbers(body).unwrap();
        assert_eq!(parsed[0].id, "9");
        assert_eq!(parsed[0].prize_amount.to_string(), "2500.00");
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(parse_winning_numbers(r#"{"error":"nope"}"#).is_err());
    }

    #[test]
    fn test_save_skips_existing_and_malformed() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let first = save_new_winning_numbers(&conn, parse_winning_numbers(LIST_BODY).unwrap(), 10).unwrap();
        assert_eq!(first.len(), 1);

        let second = save_new_winning_numbers(&conn, parse_winning_numbers(LIST_BODY).unwrap(), 10).unwrap();
        assert!(second.is_empty());
        assert_eq!(get_all_winning_numbers(&conn).unwrap().len(), 1);
    }
}
