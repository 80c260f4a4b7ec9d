//! 수집 워크플로우 통합 테스트.
//!
//! 메모리 저장소와 스크립트 제공자로 public API만 사용합니다:
//! - modules::run()
//! - modules::collect_indices()
//! - modules::fill_missing_dates()

use chrono::NaiveDate;
use index_collector::modules::{self, ReconcileOutcome};
use index_collector::{CollectorConfig, CollectorError, SymbolRegistry};
use index_data::{FetchMode, MemoryIndexStore, PriceBar, ScriptedProvider, TableSchema};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ============================================================================
// 테스트 헬퍼 함수
// ============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 테스트용 일봉 생성.
fn create_bar(date: NaiveDate, close: Decimal, volume: Option<i64>) -> PriceBar {
    PriceBar {
        date,
        open: close - dec!(1.5),
        high: close + dec!(2.25),
        low: close - dec!(3),
        close,
        adjusted_close: close,
        volume,
    }
}

/// 필수 DB 값과 추가 값으로 설정 생성.
fn create_config(extra: &[(&str, &str)]) -> Result<CollectorConfig, CollectorError> {
    let mut pairs: Vec<(&str, &str)> = vec![
        ("DB_HOST", "db.internal"),
        ("DB_USER", "collector"),
        ("DB_PASSWORD", "hunter2"),
        ("DB_NAME", "market"),
        ("REQUEST_DELAY_MS", "0"),
    ];
    pairs.extend_from_slice(extra);

    CollectorConfig::from_lookup(|key| {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
}

// ============================================================================
// 설정
// ============================================================================

#[test]
fn test_missing_required_value_fails_fast() {
    for key in ["DB_HOST", "DB_USER", "DB_NAME"] {
        let err = create_config(&[(key, "")]).unwrap_err();
        assert!(matches!(err, CollectorError::Config(_)), "{}", key);
        assert!(err.to_string().contains(key));
    }
}

#[test]
fn test_default_registry_and_flags() {
    let config = create_config(&[]).unwrap();

    assert_eq!(config.registry.len(), 6);
    assert_eq!(config.registry.table_name("ES=F"), Some("E_Mini_SP_500"));
    assert!(!config.reconcile.fill_missing_dates);
    assert_eq!(config.fetch.history_start, date(1998, 2, 26));
}

#[test]
fn test_registry_collision_is_config_error() {
    let err = SymbolRegistry::parse("BRK-B,BRK.B").unwrap_err();
    assert!(matches!(err, CollectorError::Config(_)));
}

// ============================================================================
// 전체 워크플로우
// ============================================================================

#[tokio::test]
async fn test_end_to_end_first_and_second_run() {
    let config = create_config(&[("INDEX_SYMBOLS", "X:Table_X")]).unwrap();
    let store = MemoryIndexStore::new();

    let history = vec![
        create_bar(date(2024, 6, 3), dec!(5283.4), None),
        create_bar(date(2024, 6, 4), dec!(5291.34), None),
        create_bar(date(2024, 6, 5), dec!(5354.03), None),
    ];
    let latest = create_bar(date(2024, 6, 6), dec!(5352.96), None);
    let provider = ScriptedProvider::new()
        .with_history("X", history.clone())
        .with_latest("X", vec![latest.clone()]);

    // 1차 실행: 테이블 생성 → 비어 있음 → 전체 이력
    assert!(!store.table_exists("Table_X"));
    let first = modules::run(&store, &provider, &config).await;
    assert_eq!(first.collection.success, 1);
    assert_eq!(first.collection.total_rows, 3);
    assert_eq!(store.rows("Table_X"), history);

    // 2차 실행: 데이터 있음 → 최근 거래일
    let second = modules::run(&store, &provider, &config).await;
    assert_eq!(second.collection.total_rows, 1);
    assert_eq!(store.rows("Table_X").len(), 4);
    assert_eq!(store.rows("Table_X")[3], latest);

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0].1,
        FetchMode::FullHistory {
            since: date(1998, 2, 26)
        }
    );
    assert_eq!(calls[1].1, FetchMode::LatestDay);
}

#[tokio::test]
async fn test_volume_kept_only_for_volume_tables() {
    let config = create_config(&[("INDEX_SYMBOLS", "^GSPC,ES=F:E_Mini_SP_500+volume")]).unwrap();
    let store = MemoryIndexStore::new();

    let d = date(2024, 6, 3);
    let provider = ScriptedProvider::new()
        .with_history("^GSPC", vec![create_bar(d, dec!(5283.4), Some(2_100_000_000))])
        .with_history("ES=F", vec![create_bar(d, dec!(5301.25), Some(1_450_000))]);

    let stats = modules::collect_indices(&store, &provider, &config).await;

    assert_eq!(stats.success, 2);
    assert_eq!(store.rows("GSPC")[0].volume, None);
    assert_eq!(store.rows("E_Mini_SP_500")[0].volume, Some(1_450_000));
}

#[tokio::test]
async fn test_empty_provider_result_continues_run() {
    let config = create_config(&[("INDEX_SYMBOLS", "^RUT,^VIX")]).unwrap();
    let store = MemoryIndexStore::new();
    let provider = ScriptedProvider::new()
        .with_history("^VIX", vec![create_bar(date(2024, 6, 3), dec!(12.92), None)]);

    let stats = modules::collect_indices(&store, &provider, &config).await;

    assert_eq!(stats.empty, 1);
    assert_eq!(stats.success, 1);
    assert!(store.table_exists("RUT"));
    assert!(store.rows("RUT").is_empty());
    assert_eq!(store.rows("VIX").len(), 1);
}

// ============================================================================
// 날짜 보정
// ============================================================================

#[tokio::test]
async fn test_fill_dates_aligns_all_tables() {
    let registry = SymbolRegistry::parse("A:Table_A,B:Table_B").unwrap();
    let schema = TableSchema::without_volume();

    let a = vec![
        create_bar(date(2024, 1, 1), dec!(10), None),
        create_bar(date(2024, 1, 2), dec!(20), None),
        create_bar(date(2024, 1, 4), dec!(40), None),
    ];
    let b = vec![
        create_bar(date(2024, 1, 1), dec!(100), None),
        create_bar(date(2024, 1, 3), dec!(300), None),
        create_bar(date(2024, 1, 4), dec!(400), None),
    ];
    let store = MemoryIndexStore::new()
        .with_rows("Table_A", schema, a.clone())
        .with_rows("Table_B", schema, b.clone());

    let outcome = modules::fill_missing_dates(&store, &registry).await;
    assert!(matches!(outcome, ReconcileOutcome::Reconciled(_)));

    let rows_a = store.rows("Table_A");
    let rows_b = store.rows("Table_B");
    assert_eq!(rows_a.len(), 4);
    assert_eq!(rows_b.len(), 4);

    // A의 3일은 2일 값, B의 2일은 1일 값
    assert_eq!(rows_a[2], a[1].carried_to(date(2024, 1, 3)));
    assert_eq!(rows_b[1], b[0].carried_to(date(2024, 1, 2)));
    assert_eq!(rows_a[2].close, dec!(20));
    assert_eq!(rows_b[1].close, dec!(100));
}

#[tokio::test]
async fn test_fill_dates_on_empty_tables_is_noop() {
    let registry = SymbolRegistry::parse("A:Table_A").unwrap();
    let store = MemoryIndexStore::new().with_rows("Table_A", TableSchema::without_volume(), Vec::new());

    let outcome = modules::fill_missing_dates(&store, &registry).await;

    assert!(matches!(outcome, ReconcileOutcome::NoDates));
    assert_eq!(store.write_calls(), 0);
}
