use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};
use rust_decimal::Decimal;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::period::parse_timestamp;
use crate::types::{Ticket, TicketResult, TicketSource, WinningNumber};

pub fn ensure_parent_dir(path: &str) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn create_database(path: &str) -> Result<Connection> {
    ensure_parent_dir(path).map_err(|e| {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
            Some(format!("Failed to create directory for {}: {}", path, e)),
        )
    })?;

    let conn = Connection::open(path)?;
    create_tables(&conn)?;
    info!("📁 Opened ticket database at {}", path);
    Ok(conn)
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tickets (
            id TEXT PRIMARY KEY,
            numbers TEXT NOT NULL,
            purchase_date TEXT,
            source TEXT NOT NULL DEFAULT 'manual',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS winning_numbers (
            id TEXT PRIMARY KEY,
            numbers TEXT NOT NULL,
            period TEXT NOT NULL,
            draw_date TEXT NOT NULL,
            prize_amount TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ticket_results (
            ticket_id TEXT PRIMARY KEY,
            winning_number_id TEXT,
            period TEXT,
            source TEXT NOT NULL,
            match_count INTEGER NOT NULL,
            is_winner INTEGER NOT NULL,
            prize_amount TEXT NOT NULL,
            status TEXT NOT NULL,
            tier TEXT NOT NULL,
            calculated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

fn parse_column<T>(row: &Row<'_>, column: usize) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(column)?;
    raw.parse::<T>()
        .map_err(|e| conversion_error(column, format!("{:?}: {}", raw, e)))
}

// Skips rows whose columns fail to convert; other errors still abort.
fn collect_readable<T, I>(table: &str, rows: I) -> Result<Vec<T>>
where
    I: Iterator<Item = Result<T>>,
{
    let mut items = Vec::new();
    for row in rows {
        match row {
            Ok(item) => items.push(item),
            Err(e @ rusqlite::Error::FromSqlConversionFailure(..)) => {
                warn!("⚠ Skipping unreadable {} row: {}", table, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(items)
}

/// Returns `false` when a ticket with the same id already exists.
pub fn insert_ticket(conn: &Connection, ticket: &Ticket) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO tickets (id, numbers, purchase_date, source) VALUES (?1, ?2, ?3, ?4)",
        params![
            ticket.id,
            ticket.numbers,
            ticket.purchase_date,
            ticket.source.as_str()
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_ticket(conn: &Connection, id: &str) -> Result<bool> {
    conn.execute("DELETE FROM ticket_results WHERE ticket_id = ?1", [id])?;
    let changed = conn.execute("DELETE FROM tickets WHERE id = ?1", [id])?;
    Ok(changed > 0)
}

/// All readable tickets in insertion order.
pub fn get_all_tickets(conn: &Connection) -> Result<Vec<Ticket>> {
    let mut stmt =
        conn.prepare("SELECT id, numbers, purchase_date, source FROM tickets ORDER BY rowid")?;
    let ticket_iter = stmt.query_map([], |row| {
        Ok(Ticket {
            id: row.get(0)?,
            numbers: row.get(1)?,
            purchase_date: row.get(2)?,
            source: parse_column::<TicketSource>(row, 3)?,
        })
    })?;

    collect_readable("tickets", ticket_iter)
}

/// Returns `false` when a winning number with the same id already exists.
pub fn insert_winning_number(conn: &Connection, winning: &WinningNumber) -> Result<bool> {
    let created_at = winning.created_at.unwrap_or_else(Utc::now);
    let changed = conn.execute(
        "INSERT OR IGNORE INTO winning_numbers (
            id, numbers, period, draw_date, prize_amount, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            winning.id,
            winning.numbers,
            winning.period,
            winning.draw_date.to_rfc3339(),
            winning.prize_amount.to_string(),
            created_at.to_rfc3339(),
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_winning_number(conn: &Connection, id: &str) -> Result<bool> {
    let changed = conn.execute("DELETE FROM winning_numbers WHERE id = ?1", [id])?;
    Ok(changed > 0)
}

pub fn winning_number_exists(conn: &Connection, id: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM winning_numbers WHERE id = ?1")?;
    let count: i64 = stmt.query_row([id], |row| row.get(0))?;
    Ok(count > 0)
}

fn winning_number_from_row(row: &Row<'_>) -> Result<WinningNumber> {
    let draw_date: String = row.get(3)?;
    let created_at: Option<String> = row.get(5)?;
    Ok(WinningNumber {
        id: row.get(0)?,
        numbers: row.get(1)?,
        period: row.get(2)?,
        draw_date: parse_timestamp(&draw_date)
            .ok_or_else(|| conversion_error(3, format!("unreadable draw date {:?}", draw_date)))?,
        prize_amount: parse_column::<Decimal>(row, 4)?,
        created_at: created_at.as_deref().and_then(parse_timestamp),
    })
}

/// Newest draw first.
pub fn get_all_winning_numbers(conn: &Connection) -> Result<Vec<WinningNumber>> {
    let mut stmt = conn.prepare(
        "SELECT id, numbers, period, draw_date, prize_amount, created_at
         FROM winning_numbers ORDER BY draw_date DESC",
    )?;
    let winning_iter = stmt.query_map([], winning_number_from_row)?;
    collect_readable("winning_numbers", winning_iter)
}

pub fn get_winning_number(conn: &Connection, id: &str) -> Result<Option<WinningNumber>> {
    let mut stmt = conn.prepare(
        "SELECT id, numbers, period, draw_date, prize_amount, created_at
         FROM winning_numbers WHERE id = ?1",
    )?;
    stmt.query_row([id], winning_number_from_row).optional()
}

/// Replaces every stored result with `results` in one transaction.
pub fn save_ticket_results(conn: &mut Connection, results: &[TicketResult]) -> Result<usize> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM ticket_results", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO ticket_results (
                ticket_id, winning_number_id, period, source, match_count,
                is_winner, prize_amount, status, tier
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for result in results {
            stmt.execute(params![
                result.ticket_id,
                result.winning_number_id,
                result.period,
                result.source.as_str(),
                result.match_count as i64,
                result.is_winner,
                result.prize_amount.to_string(),
                result.status.as_str(),
                result.tier.as_str(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(results.len())
}

pub fn get_ticket_results(conn: &Connection) -> Result<Vec<TicketResult>> {
    let mut stmt = conn.prepare(
        "SELECT ticket_id, winning_number_id, period, source, match_count,
                is_winner, prize_amount, status, tier
         FROM ticket_results ORDER BY rowid",
    )?;
    let result_iter = stmt.query_map([], |row| {
        let match_count: i64 = row.get(4)?;
        Ok(TicketResult {
            ticket_id: row.get(0)?,
            winning_number_id: row.get(1)?,
            period: row.get(2)?,
            source: parse_column(row, 3)?,
            match_count: usize::try_from(match_count)
                .map_err(|e| conversion_error(4, e.to_string()))?,
            is_winner: row.get(5)?,
            prize_amount: parse_column(row, 6)?,
            status: parse_column(row, 7)?,
            tier: parse_column(row, 8)?,
        })
    })?;

    let mut results = Vec::new();
    for result in result_iter {
        results.push(result?);
    }
    Ok(results)
}
