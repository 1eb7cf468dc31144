use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use lotto_match::{
    MatchConfig, MatchTier, ResultStatus, Ticket, TicketSource, WinningNumber, aggregate, classify,
    digit_match,
};

fn ticket(id: &str, numbers: &str, purchase_date: &str) -> Ticket {
    Ticket {
        id: id.to_string(),
        numbers: numbers.to_string(),
        purchase_date: Some(purchase_date.to_string()),
        source: TicketSource::Manual,
    }
}

fn january_draw() -> WinningNumber {
    WinningNumber {
        id: "w-2025-01".to_string(),
        numbers: "1234567890".to_string(),
        period: "2025-01".to_string(),
        draw_date: Utc.with_ymd_and_hms(2025, 1, 31, 18, 0, 0).unwrap(),
        prize_amount: dec!(25000),
        created_at: None,
    }
}

#[test]
fn scenario_a_full_match_wins() {
    let result = classify(
        &ticket("a", "1234567890", "2025-01-03T10:00:00Z"),
        &[january_draw()],
        &MatchConfig::default(),
    )
    .unwrap();

    assert_eq!(result.match_count, 10);
    assert!(result.is_winner);
    assert_eq!(result.prize_amount, dec!(25000));
}

#[test]
fn scenario_b_nine_digits_is_not_a_win() {
    let result = classify(
        &ticket("b", "1234567899", "2025-01-03T10:00:00Z"),
        &[january_draw()],
        &MatchConfig::default(),
    )
    .unwrap();

    assert_eq!(result.match_count, 9);
    assert!(!result.is_winner);
    assert_eq!(result.prize_amount, Decimal::ZERO);
}

#[test]
fn scenario_c_no_digits_match() {
    let result = classify(
        &ticket("c", "0000000001", "2025-01-03T10:00:00Z"),
        &[january_draw()],
        &MatchConfig::default(),
    )
    .unwrap();

    assert_eq!(result.match_count, 0);
    assert!(!result.is_winner);
    assert_eq!(result.status, ResultStatus::Lost);
    assert_eq!(result.tier, MatchTier::Low);

    let repeated_five = classify(
        &ticket("c5", "5555555555", "2025-01-03T10:00:00Z"),
        &[january_draw()],
        &MatchConfig::default(),
    )
    .unwrap();
    assert_eq!(repeated_five.match_count, 1);
    assert!(!repeated_five.is_winner);
}

#[test]
fn scenario_d_unpublished_period_is_pending() {
    let tickets = vec![ticket("d", "1234567890", "2025-02-03T10:00:00Z")];
    let aggregation = aggregate(&tickets, &[january_draw()], &MatchConfig::default());

    let result = &aggregation.results[0];
    assert_eq!(result.winning_number_id, None);
    assert!(!result.is_winner);
    assert_eq!(result.match_count, 0);
    assert_eq!(result.status, ResultStatus::Pending);
    assert_eq!(aggregation.summary.pending_tickets, 1);
}

#[test]
fn scenario_e_mixed_batch() {
    let tickets = vec![
        ticket("winner", "1234567890", "2025-01-03T10:00:00Z"),
        ticket("partial", "1234000000", "2025-01-04T10:00:00Z"),
        ticket("pending", "1234567890", "2025-02-01T10:00:00Z"),
    ];
    let aggregation = aggregate(&tickets, &[january_draw()], &MatchConfig::default());
    let summary = &aggregation.summary;

    assert_eq!(summary.total_tickets, 3);
    assert_eq!(summary.total_winners, 1);
    assert_eq!(summary.pending_tickets, 1);
    assert!((summary.win_rate - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(summary.total_prize, dec!(25000));

    let ids: Vec<_> = aggregation.results.iter().map(|r| r.ticket_id.as_str()).collect();
    assert_eq!(ids, vec!["winner", "partial", "pending"]);
    assert!(aggregation.issues.is_empty());
}

#[test]
fn aggregate_is_idempotent() {
    let tickets = vec![
        ticket("1", "1234567890", "2025-01-03T10:00:00Z"),
        ticket("2", "0234567890", "2025-01-05"),
        ticket("3", "1234567890", "garbage"),
        ticket("4", "12", "2025-01-05"),
    ];
    let winning_numbers = vec![january_draw()];
    let config = MatchConfig::default();

    let first = aggregate(&tickets, &winning_numbers, &config);
    let second = aggregate(&tickets, &winning_numbers, &config);
    assert_eq!(first, second);
}

#[test]
fn digit_match_properties() {
    let samples = [
        "0000000000",
        "1234567890",
        "0987654321",
        "1111111111",
        "9081726354",
        "5555555555",
    ];
    for a in samples {
        assert_eq!(digit_match(a, a, 10), Ok(10));
        for b in samples {
            let forward = digit_match(a, b, 10).unwrap();
            assert_eq!(Ok(forward), digit_match(b, a, 10));
            assert!(forward <= 10);
        }
    }
}

#[test]
fn win_rate_stays_in_range() {
    let config = MatchConfig::default();
    let draw = january_draw();

    let empty = aggregate(&[], &[draw.clone()], &config);
    assert_eq!(empty.summary.win_rate, 0.0);

    let all_win: Vec<_> = (0..4)
        .map(|i| ticket(&i.to_string(), "1234567890", "2025-01-10"))
        .collect();
    let summary = aggregate(&all_win, &[draw.clone()], &config).summary;
    assert_eq!(summary.win_rate, 100.0);

    let all_pending: Vec<_> = (0..4)
        .map(|i| ticket(&i.to_string(), "1234567890", "2025-03-10"))
        .collect();
    let summary = aggregate(&all_pending, &[draw], &config).summary;
    assert_eq!(summary.win_rate, 0.0);
    assert_eq!(summary.total_tickets, 4);
}
