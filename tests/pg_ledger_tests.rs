//! Ledger tests against Postgres.
//!
//! Each test gets a fresh database with the embedded migrations applied.
//! Run with `DATABASE_URL` set and `cargo test -- --ignored`.

use std::sync::Arc;

use bbm_monitoring::models::stock::{Location, StockMovement, StockType};
use bbm_monitoring::repositories::stock_repository::StockRepository;
use bbm_monitoring::services::ledger::{StockLedger, MAX_BALANCE};
use bbm_monitoring::services::StockService;
use bbm_monitoring::utils::calendar::BusinessCalendar;
use bbm_monitoring::utils::errors::AppError;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;

fn service(pool: &PgPool) -> StockService {
    StockService::new(Arc::new(StockRepository::new(pool.clone())), BusinessCalendar::default())
}

async fn seed_user(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (email, password_hash, name, role) VALUES ('ops@bbm.local', 'x', 'Ops', 1) RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn insert_row(
    pool: &PgPool,
    stock_type: StockType,
    location: Location,
    amount: Decimal,
    balance: Decimal,
    user_id: i64,
    created_at: DateTime<Utc>,
) {
    sqlx::query(
        "INSERT INTO stocks (type, location, amount, balance, user_id, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(stock_type)
    .bind(location)
    .bind(amount)
    .bind(balance)
    .bind(user_id)
    .bind(created_at)
    .execute(pool)
    .await
    .unwrap();
}

async fn row_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stocks")
        .fetch_one(pool)
        .await
        .unwrap()
}

fn assert_chain_is_consistent(rows: &[StockMovement]) {
    for location in Location::ALL {
        let mut running = Decimal::ZERO;
        for row in rows.iter().filter(|row| row.location == location) {
            running += row.stock_type.signed(row.amount);
            assert_eq!(row.balance, running, "row {} breaks the running balance", row.id);
        }
    }
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn empty_locations_have_zero_balance(pool: PgPool) {
    let repository = StockRepository::new(pool);
    for location in Location::ALL {
        assert_eq!(repository.current_balance(location).await.unwrap(), Decimal::ZERO);
    }
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn out_spills_from_tug_assist_into_genset(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let service = service(&pool);

    service.record_in(Location::Genset, dec!(500), None, user_id).await.unwrap();
    service.record_in(Location::TugAssist, dec!(80), None, user_id).await.unwrap();

    let rows = service.record_out(dec!(100), Some("generator run".into()), user_id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].location, rows[0].amount, rows[0].balance), (Location::TugAssist, dec!(80), dec!(0)));
    assert_eq!((rows[1].location, rows[1].amount, rows[1].balance), (Location::Genset, dec!(20), dec!(480)));
    assert_eq!(rows[1].notes.as_deref(), Some("generator run"));

    assert_eq!(service.current_balance(Location::Genset).await.unwrap(), dec!(480));
    assert_eq!(service.current_balance(Location::TugAssist).await.unwrap(), dec!(0));
    assert_eq!(row_count(&pool).await, 4);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn out_beyond_total_stock_writes_nothing(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let service = service(&pool);
    service.record_in(Location::TugAssist, dec!(25), None, user_id).await.unwrap();

    let err = service.record_out(dec!(25.01), None, user_id).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { .. }));
    assert_eq!(row_count(&pool).await, 1);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn today_stats_split_at_local_midnight(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    // 15:30 UTC on the 14th is 23:30 at +08:00, still the previous business day
    let late_yesterday = Utc.with_ymd_and_hms(2026, 7, 14, 15, 30, 0).unwrap();
    let early_today = Utc.with_ymd_and_hms(2026, 7, 14, 16, 30, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 7, 15, 2, 0, 0).unwrap();

    insert_row(&pool, StockType::In, Location::TugAssist, dec!(100), dec!(100), user_id, late_yesterday).await;
    insert_row(&pool, StockType::Out, Location::TugAssist, dec!(40), dec!(60), user_id, early_today).await;
    insert_row(&pool, StockType::In, Location::TugAssist, dec!(10), dec!(70), user_id, early_today).await;
    insert_row(&pool, StockType::In, Location::Genset, dec!(300), dec!(300), user_id, early_today).await;

    let stats = service(&pool).today_stats_at(&Location::ALL, now).await.unwrap();
    let genset = &stats[0];
    assert_eq!((genset.initial_stock, genset.today_in, genset.final_stock), (dec!(0), dec!(300), dec!(300)));

    let tug = &stats[1];
    assert_eq!(tug.initial_stock, dec!(100));
    assert_eq!(tug.today_in, dec!(10));
    assert_eq!(tug.today_out, dec!(40));
    assert_eq!(tug.final_stock, dec!(70));

    let repository = StockRepository::new(pool);
    let midnight = BusinessCalendar::default().start_of_today(now);
    assert_eq!(repository.balance_before(Location::TugAssist, midnight).await.unwrap(), dec!(100));
    assert_eq!(repository.movements_since(midnight, None).await.unwrap().len(), 3);

    let tug_rows = repository.movements_since(midnight, Some(Location::TugAssist)).await.unwrap();
    assert_eq!(tug_rows.len(), 2);
    assert!(tug_rows.iter().all(|row| row.location == Location::TugAssist));
    assert!(tug_rows[0].id < tug_rows[1].id);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn concurrent_writers_keep_the_balance_chain_intact(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let service = service(&pool);
    service.record_in(Location::TugAssist, dec!(40), None, user_id).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..30 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            match i % 3 {
                0 => service.record_in(Location::Genset, dec!(5), None, user_id).await.map(|_| ()),
                1 => service.record_in(Location::TugAssist, dec!(1.5), None, user_id).await.map(|_| ()),
                // each OUT drains TUG_ASSIST before touching GENSET
                _ => service.record_out(dec!(4), None, user_id).await.map(|_| ()),
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 40 + 10 * 1.5 + 10 * 5 - 10 * 4 in total
    let genset = service.current_balance(Location::Genset).await.unwrap();
    let tug = service.current_balance(Location::TugAssist).await.unwrap();
    assert_eq!(genset + tug, dec!(65));

    let epoch = Utc.timestamp_opt(0, 0).unwrap();
    let rows = StockRepository::new(pool).movements_since(epoch, None).await.unwrap();
    assert_chain_is_consistent(&rows);
    assert!(rows.iter().all(|row| row.balance >= Decimal::ZERO));
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn negative_balances_are_refused_by_the_schema(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let result = sqlx::query(
        "INSERT INTO stocks (type, location, amount, balance, user_id) VALUES ('OUT', 'GENSET', 5, -5, $1)",
    )
    .bind(user_id)
    .execute(&pool)
    .await;

    assert!(result.is_err());
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn stock_in_beyond_the_column_range_is_a_validation_error(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    insert_row(
        &pool,
        StockType::In,
        Location::Genset,
        dec!(9999999000),
        dec!(9999999000),
        user_id,
        Utc::now(),
    )
    .await;

    let service = service(&pool);
    let err = service.record_in(Location::Genset, dec!(1000), None, user_id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let row = service.record_in(Location::Genset, dec!(999.99), None, user_id).await.unwrap();
    assert_eq!(row.balance, MAX_BALANCE);
}
