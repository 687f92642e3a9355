use std::sync::Arc;

use bbm_monitoring::models::stock::{Location, NewMovement, StockType};
use bbm_monitoring::services::memory_ledger::InMemoryLedger;
use bbm_monitoring::services::StockService;
use bbm_monitoring::utils::calendar::BusinessCalendar;
use bbm_monitoring::utils::errors::AppError;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn service() -> (Arc<InMemoryLedger>, StockService) {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = StockService::new(ledger.clone(), BusinessCalendar::default());
    (ledger, service)
}

fn seed(location: Location, stock_type: StockType, amount: Decimal, balance: Decimal) -> NewMovement {
    NewMovement {
        stock_type,
        location,
        amount,
        balance,
        notes: None,
        user_id: 1,
    }
}

#[tokio::test]
async fn empty_locations_have_zero_balance() {
    let (_, service) = service();
    for location in Location::ALL {
        assert_eq!(service.current_balance(location).await.unwrap(), Decimal::ZERO);
    }

    let summary = service.summary(&Location::ALL).await.unwrap();
    assert_eq!(summary.len(), 2);
    assert!(summary.iter().all(|entry| entry.balance == Decimal::ZERO));
}

#[tokio::test]
async fn out_spills_from_tug_assist_into_genset() {
    let (ledger, service) = service();
    service.record_in(Location::Genset, dec!(500), None, 1).await.unwrap();
    service.record_in(Location::TugAssist, dec!(80), None, 1).await.unwrap();

    let rows = service
        .record_out(dec!(100), Some("generator run".into()), 2)
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].location, rows[0].amount, rows[0].balance), (Location::TugAssist, dec!(80), dec!(0)));
    assert_eq!((rows[1].location, rows[1].amount, rows[1].balance), (Location::Genset, dec!(20), dec!(480)));
    assert!(rows.iter().all(|row| row.stock_type == StockType::Out && row.user_id == 2));
    assert!(rows[0].id < rows[1].id);

    assert_eq!(ledger.rows().await.len(), 4);
}

#[tokio::test]
async fn out_covered_by_tug_assist_writes_one_row() {
    let (_, service) = service();
    service.record_in(Location::Genset, dec!(500), None, 1).await.unwrap();
    service.record_in(Location::TugAssist, dec!(80), None, 1).await.unwrap();

    let rows = service.record_out(dec!(30.5), None, 1).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].location, Location::TugAssist);
    assert_eq!(rows[0].balance, dec!(49.5));
    assert_eq!(service.current_balance(Location::Genset).await.unwrap(), dec!(500));
}

#[tokio::test]
async fn out_beyond_total_stock_writes_nothing() {
    let (ledger, service) = service();
    service.record_in(Location::Genset, dec!(50), None, 1).await.unwrap();
    service.record_in(Location::TugAssist, dec!(25), None, 1).await.unwrap();

    let err = service.record_out(dec!(75.01), None, 1).await.unwrap_err();
    match err {
        AppError::InsufficientStock { requested, available } => {
            assert_eq!(requested, dec!(75.01));
            assert_eq!(available, dec!(75));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(ledger.rows().await.len(), 2);
}

#[tokio::test]
async fn invalid_amounts_are_rejected_before_writing() {
    let (ledger, service) = service();

    for amount in [dec!(0), dec!(-5), dec!(1.005), dec!(1000000000.01)] {
        let err = service.record_in(Location::Genset, amount, None, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{amount} should be rejected");
    }
    assert!(matches!(
        service.record_out(dec!(0), None, 1).await,
        Err(AppError::Validation(_))
    ));
    assert!(ledger.rows().await.is_empty());
}

#[tokio::test]
async fn today_stats_without_movements_today_carry_the_opening_balance() {
    let (ledger, service) = service();
    let now = Utc.with_ymd_and_hms(2026, 7, 15, 4, 0, 0).unwrap();
    let yesterday = now - Duration::days(1);

    ledger
        .insert_at(seed(Location::Genset, StockType::In, dec!(300), dec!(300)), yesterday)
        .await;

    let stats = service.today_stats_at(&[Location::Genset], now).await.unwrap();
    assert_eq!(stats.len(), 1);
    let genset = &stats[0];
    assert_eq!(genset.initial_stock, dec!(300));
    assert_eq!(genset.today_in, Decimal::ZERO);
    assert_eq!(genset.today_out, Decimal::ZERO);
    assert_eq!(genset.final_stock, genset.initial_stock);
}

#[tokio::test]
async fn today_stats_split_at_local_midnight() {
    let (ledger, service) = service();
    // 15:30 UTC on the 14th is 23:30 local, still "yesterday"
    let late_yesterday = Utc.with_ymd_and_hms(2026, 7, 14, 15, 30, 0).unwrap();
    let early_today = Utc.with_ymd_and_hms(2026, 7, 14, 16, 30, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 7, 15, 2, 0, 0).unwrap();

    ledger
        .insert_at(seed(Location::TugAssist, StockType::In, dec!(100), dec!(100)), late_yesterday)
        .await;
    ledger
        .insert_at(seed(Location::TugAssist, StockType::Out, dec!(40), dec!(60)), early_today)
        .await;
    ledger
        .insert_at(seed(Location::TugAssist, StockType::In, dec!(10), dec!(70)), early_today)
        .await;

    let stats = service.today_stats_at(&[Location::TugAssist], now).await.unwrap();
    assert_eq!(stats[0].initial_stock, dec!(100));
    assert_eq!(stats[0].today_in, dec!(10));
    assert_eq!(stats[0].today_out, dec!(40));
    assert_eq!(stats[0].final_stock, dec!(70));
}

#[tokio::test]
async fn trend_has_one_point_per_day_and_location() {
    let (ledger, service) = service();
    let now = Utc.with_ymd_and_hms(2026, 7, 15, 4, 0, 0).unwrap();
    ledger
        .insert_at(
            seed(Location::Genset, StockType::In, dec!(200), dec!(200)),
            now - Duration::days(2),
        )
        .await;

    let points = service.trend_at(Some(3), &Location::ALL, now).await.unwrap();
    // today minus 3 days through today
    assert_eq!(points.len(), 8);

    let genset: Vec<Decimal> = points
        .iter()
        .filter(|p| p.location == Location::Genset)
        .map(|p| p.balance)
        .collect();
    assert_eq!(genset, vec![dec!(0), dec!(200), dec!(200), dec!(200)]);
}

#[tokio::test]
async fn trend_days_are_clamped() {
    let (_, service) = service();
    let now = Utc::now();
    let points = service.trend_at(Some(0), &[Location::Genset], now).await.unwrap();
    assert_eq!(points.len(), 2);

    let points = service.trend_at(Some(10_000), &[Location::Genset], now).await.unwrap();
    assert_eq!(points.len(), 366);
}

#[tokio::test]
async fn low_stock_flags_locations_under_threshold() {
    let (_, service) = service();
    service.record_in(Location::Genset, dec!(250), None, 1).await.unwrap();
    service.record_in(Location::TugAssist, dec!(40), None, 1).await.unwrap();

    let report = service.low_stock_check(&Location::ALL, dec!(100)).await.unwrap();
    assert!(report.has_alerts);
    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].location, Location::TugAssist);
    assert_eq!(report.alerts[0].message, "Low stock at TUG_ASSIST: 40 L (threshold: 100 L)");

    let report = service.low_stock_check(&[Location::Genset], dec!(100)).await.unwrap();
    assert!(!report.has_alerts);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_keep_the_balance_chain_intact() {
    let (ledger, service) = service();
    service.record_in(Location::TugAssist, dec!(1000), None, 1).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..40 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                service.record_in(Location::Genset, dec!(5), None, 1).await.map(|_| ())
            } else {
                service.record_out(dec!(3), None, 1).await.map(|_| ())
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(service.current_balance(Location::Genset).await.unwrap(), dec!(100));
    assert_eq!(service.current_balance(Location::TugAssist).await.unwrap(), dec!(940));
    assert_chain_is_consistent(&ledger.rows().await);
}

fn assert_chain_is_consistent(rows: &[bbm_monitoring::models::stock::StockMovement]) {
    for location in Location::ALL {
        let mut running = Decimal::ZERO;
        for row in rows.iter().filter(|row| row.location == location) {
            running += row.stock_type.signed(row.amount);
            assert_eq!(row.balance, running, "row {} breaks the running balance", row.id);
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    In(Location, i64),
    Out(i64),
}

fn op() -> impl Strategy<Value = Op> {
    let location = prop_oneof![Just(Location::Genset), Just(Location::TugAssist)];
    prop_oneof![
        (location, 1i64..100_000).prop_map(|(location, cents)| Op::In(location, cents)),
        (1i64..100_000).prop_map(Op::Out),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_balance_is_the_sum_of_the_rows_before_it(ops in prop::collection::vec(op(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let (ledger, service) = service();

            for op in ops {
                match op {
                    Op::In(location, cents) => {
                        service.record_in(location, Decimal::new(cents, 2), None, 1).await.unwrap();
                    }
                    Op::Out(cents) => {
                        let before = ledger.rows().await.len();
                        let available = service.current_balance(Location::Genset).await.unwrap()
                            + service.current_balance(Location::TugAssist).await.unwrap();
                        let amount = Decimal::new(cents, 2);

                        match service.record_out(amount, None, 1).await {
                            Ok(rows) => {
                                assert!(amount <= available);
                                assert!(!rows.is_empty() && rows.len() <= 2);
                                assert_eq!(rows.iter().map(|r| r.amount).sum::<Decimal>(), amount);
                            }
                            Err(AppError::InsufficientStock { .. }) => {
                                assert!(amount > available);
                                assert_eq!(ledger.rows().await.len(), before);
                            }
                            Err(other) => panic!("unexpected error: {other:?}"),
                        }
                    }
                }
            }

            let rows = ledger.rows().await;
            assert_chain_is_consistent(&rows);
            assert!(rows.iter().all(|row| row.balance >= Decimal::ZERO));
        });
    }
}
