use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lotto_match::api::fetch_and_save_winning_numbers;
use lotto_match::config::{self, Config};
use lotto_match::database::{
    create_database, delete_ticket, delete_winning_number, get_all_tickets,
    get_all_winning_numbers, get_ticket_results, insert_ticket, insert_winning_number,
    save_ticket_results,
};
use lotto_match::import::{ImportSummary, import_ticket_files, import_winning_number_files};
use lotto_match::utils::{describe_result, format_period_label, format_prize_amount, format_ticket_numbers};
use lotto_match::{
    Aggregation, SummaryStatistics, Ticket, TicketSource, WinningNumber, aggregate, parse_timestamp,
    period_key, validate_numbers,
};

#[derive(Parser)]
#[command(name = "lotto-match", about = "Track lottery tickets and check them against published winning numbers")]
struct Cli {
    /// SQLite database path (overrides LOTTO_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database tables
    Init,

    /// Record a ticket
    AddTicket {
        numbers: String,
        #[arg(short, long, default_value = "manual")]
        source: TicketSource,
        /// Purchase time, defaults to now
        #[arg(long)]
        purchase_date: Option<String>,
    },

    /// Remove a ticket and its stored result
    DeleteTicket { id: String },

    /// Publish a winning number
    Publish {
        numbers: String,
        /// Period key, defaults to the draw date's period
        #[arg(long)]
        period: Option<String>,
        /// Draw time, defaults to now
        #[arg(long)]
        draw_date: Option<String>,
        #[arg(long, default_value = "10000")]
        prize: Decimal,
    },

    /// Remove a published winning number
    DeleteWinning { id: String },

    /// Import tickets from a JSON file or a directory of JSON files
    ImportTickets { path: PathBuf },

    /// Import winning numbers from a JSON file or a directory of JSON files
    ImportWinning { path: PathBuf },

    /// Fetch published winning numbers over HTTP
    Fetch {
        /// Endpoint URL (overrides LOTTO_WINNING_NUMBERS_URL)
        url: Option<String>,
    },

    /// Match all tickets against the winning numbers
    Check {
        /// Store the results, replacing earlier ones
        #[arg(long)]
        save: bool,
        /// Print JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Show the last saved results
    Results,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let mut config = config::load()?;
    if let Some(db) = cli.db {
        config.database_url = db;
    }

    let mut conn = create_database(&config.database_url)
        .with_context(|| format!("Failed to open {}", config.database_url))?;
    let number_length = config.matching.number_length();

    match cli.command {
        Command::Init => {
            info!("🎰 Database ready at {}", config.database_url);
        }
        Command::AddTicket {
            numbers,
            source,
            purchase_date,
        } => {
            validate_numbers("new ticket", &numbers, number_length)?;
            let ticket = Ticket {
                id: uuid::Uuid::new_v4().to_string(),
                numbers,
                purchase_date: Some(purchase_date.unwrap_or_else(|| Utc::now().to_rfc3339())),
                source,
            };
            insert_ticket(&conn, &ticket)?;
            println!("🎟️ Ticket {} saved: {}", ticket.id, format_ticket_numbers(&ticket.numbers));
        }
        Command::DeleteTicket { id } => {
            if !delete_ticket(&conn, &id)? {
                bail!("No ticket with id {}", id);
            }
            println!("Deleted ticket {}", id);
        }
        Command::Publish {
            numbers,
            period,
            draw_date,
            prize,
        } => {
            validate_numbers("new winning number", &numbers, number_length)?;
            let draw_date = match draw_date {
                Some(raw) => parse_timestamp(&raw).with_context(|| format!("Unreadable draw date {:?}", raw))?,
                None => Utc::now(),
            };
            let winning = WinningNumber {
                id: uuid::Uuid::new_v4().to_string(),
                numbers,
                period: period.unwrap_or_else(|| period_key(&draw_date, config.matching.granularity())),
                draw_date,
                prize_amount: prize,
                created_at: Some(Utc::now()),
            };
            insert_winning_number(&conn, &winning)?;
            println!(
                "🏆 Winning number {} published for {}",
                format_ticket_numbers(&winning.numbers),
                format_period_label(&winning.period)
            );
        }
        Command::DeleteWinning { id } => {
            if !delete_winning_number(&conn, &id)? {
                bail!("No winning number with id {}", id);
            }
            println!("Deleted winning number {}", id);
        }
        Command::ImportTickets { path } => {
            let summary = import_ticket_files(&conn, &path, number_length)?;
            print_import_summary("tickets", &summary);
        }
        Command::ImportWinning { path } => {
            let summary = import_winning_number_files(&conn, &path, number_length)?;
            print_import_summary("winning numbers", &summary);
        }
        Command::Fetch { url } => {
            let Some(url) = url.or_else(|| config.winning_numbers_url.clone()) else {
                bail!("No URL given and LOTTO_WINNING_NUMBERS_URL is not set");
            };
            let saved = fetch_and_save_winning_numbers(&conn, &url, number_length).await?;
            println!("Saved {} new winning numbers", saved.len());
        }
        Command::Check { save, json } => {
            let aggregation = run_check(&conn, &config)?;
            if save {
                let stored = save_ticket_results(&mut conn, &aggregation.results)?;
                info!("💾 Stored {} ticket results", stored);
            }
            if json {
                print_json(&aggregation)?;
            } else {
                print_report(&aggregation);
            }
        }
        Command::Results => {
            let results = get_ticket_results(&conn)?;
            if results.is_empty() {
                println!("No saved results. Run `check --save` first.");
            }
            for result in &results {
                println!(
                    "{:<38} {:<9} {}",
                    result.ticket_id,
                    result.period.as_deref().unwrap_or("-"),
                    describe_result(result)
                );
            }
        }
    }

    Ok(())
}

fn run_check(conn: &rusqlite::Connection, config: &Config) -> Result<Aggregation> {
    let tickets = get_all_tickets(conn)?;
    let winning_numbers = get_all_winning_numbers(conn)?;
    info!(
        "Checking {} tickets against {} winning numbers",
        tickets.len(),
        winning_numbers.len()
    );

    let aggregation = aggregate(&tickets, &winning_numbers, &config.matching);
    for issue in &aggregation.issues {
        warn!("{}", issue);
    }
    Ok(aggregation)
}

fn print_import_summary(kind: &str, summary: &ImportSummary) {
    println!(
        "Imported {} {} ({} already present, {} rejected)",
        summary.imported, kind, summary.duplicates, summary.rejected
    );
}

fn print_json(aggregation: &Aggregation) -> Result<()> {
    let errors: Vec<String> = aggregation.errors().map(|e| e.to_string()).collect();
    let warnings: Vec<String> = aggregation.warnings().map(|e| e.to_string()).collect();
    let output = json!({
        "results": aggregation.results,
        "summary": aggregation.summary,
        "errors": errors,
        "warnings": warnings,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_report(aggregation: &Aggregation) {
    let summary: &SummaryStatistics = &aggregation.summary;

    println!("\n📊 Results");
    println!("   Total tickets:  {}", summary.total_tickets);
    println!("   Winners:        {}", summary.total_winners);
    println!("   Near misses:    {}", summary.near_misses);
    println!("   Pending:        {}", summary.pending_tickets);
    println!("   Win rate:       {:.1}%", summary.win_rate);
    println!("   Total prizes:   {}", format_prize_amount(&summary.total_prize));
    println!("   Avg per period: {:.1}", summary.average_tickets_per_period());

    if !summary.by_period.is_empty() {
        println!("\n📅 By period");
        for (period, stats) in summary.by_period.iter().rev() {
            println!(
                "   {:<16} {:>4} tickets {:>3} winners {:>3} pending {:>6.1}%",
                format_period_label(period),
                stats.tickets,
                stats.winners,
                stats.pending,
                stats.win_rate
            );
        }
    }

    if !summary.by_source.is_empty() {
        println!("\n📨 By source");
        for (source, stats) in &summary.by_source {
            println!("   {:<8} {:>4} tickets {:>3} winners", source, stats.tickets, stats.winners);
        }
    }

    let errors = aggregation.errors().count();
    if errors > 0 {
        println!("\n⚠ {} records excluded for invalid numbers", errors);
    }
    println!();
}
