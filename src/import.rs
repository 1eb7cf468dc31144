use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::database::{insert_ticket, insert_winning_number};
use crate::matcher::validate_numbers;
use crate::types::{Ticket, WinningNumber};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

impl ImportSummary {
    fn merge(&mut self, other: ImportSummary) {
        self.imported += other.imported;
        self.duplicates += other.duplicates;
        self.rejected += other.rejected;
    }
}

fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

pub fn load_tickets(path: &Path) -> Result<Vec<Ticket>> {
    read_json_array(path)
}

pub fn load_winning_numbers(path: &Path) -> Result<Vec<WinningNumber>> {
    read_json_array(path)
}

/// `.json` files directly inside `dir`, sorted by name.
pub fn json_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Expands a path argument into the JSON files it names.
pub fn resolve_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        json_files_in(path)
    } else {
        Ok(vec![path.to_path_buf()])
    }
}

/// Stores well-formed tickets. Malformed numbers are skipped, not fatal.
pub fn import_tickets(conn: &Connection, tickets: &[Ticket], number_length: usize) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for ticket in tickets {
        if let Err(e) = validate_numbers(&ticket.id, &ticket.numbers, number_length) {
            warn!("⚠ Skipping ticket: {}", e);
            summary.rejected += 1;
            continue;
        }
        if insert_ticket(conn, ticket)? {
            summary.imported += 1;
        } else {
            summary.duplicates += 1;
        }
    }
    Ok(summary)
}

pub fn import_winning_numbers(
    conn: &Connection,
    winning_numbers: &[WinningNumber],
    number_length: usize,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for winning in winning_numbers {
        if let Err(e) = validate_numbers(&winning.id, &winning.numbers, number_length) {
            warn!("⚠ Skipping winning number: {}", e);
            summary.rejected += 1;
            continue;
        }
        if insert_winning_number(conn, winning)? {
            summary.imported += 1;
        } else {
            summary.duplicates += 1;
        }
    }
    Ok(summary)
}

pub fn import_ticket_files(conn: &Connection, path: &Path, number_length: usize) -> Result<ImportSummary> {
    let mut total = ImportSummary::default();
    for file in resolve_inputs(path)? {
        info!("Reading file: {}", file.display());
        let tickets = load_tickets(&file)?;
        total.merge(import_tickets(conn, &tickets, number_length)?);
    }
    Ok(total)
}

pub fn import_winning_number_files(
    conn: &Connection,
    path: &Path,
    number_length: usize,
) -> Result<ImportSummary> {
    let mut total = ImportSummary::default();
    for file in resolve_inputs(path)? {
        info!("Reading file: {}", file.display());
        let winning_numbers = load_winning_numbers(&file)?;
        total.merge(import_winning_numbers(conn, &winning_numbers, number_length)?);
    }
    Ok(total)
}
