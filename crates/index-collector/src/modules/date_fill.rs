//! 누락 날짜 보정 모듈.
//!
//! 모든 지수 테이블 날짜의 합집합을 구한 뒤, 각 테이블에서 빠진 날짜를
//! 직전 거래일 값으로 채워 넣습니다 (forward-fill).
//!
//! 기존 행은 다시 쓰지 않고 새로 채운 행만 upsert하므로
//! 여러 번 실행해도 결과가 같습니다.

use index_data::reconcile::{missing_rows, union_dates};
use index_data::IndexStore;
use std::time::Instant;

use crate::registry::SymbolRegistry;
use crate::CollectionStats;

/// 날짜 보정 결과.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// 어느 테이블에도 날짜가 없어 아무것도 쓰지 않음
    NoDates,
    /// 테이블별 보정 완료
    Reconciled(CollectionStats),
}

/// 모든 지수 테이블의 누락 날짜를 forward-fill.
///
/// 한 테이블의 실패는 로그만 남기고 나머지 테이블 보정을 계속합니다.
pub async fn fill_missing_dates(
    store: &dyn IndexStore,
    registry: &SymbolRegistry,
) -> ReconcileOutcome {
    let start = Instant::now();

    // 1. 전체 날짜 합집합
    let mut per_table = Vec::with_capacity(registry.len());
    for entry in registry.iter() {
        match store.load_dates(entry.table()).await {
            Ok(dates) => per_table.push(dates),
            Err(e) => {
                tracing::warn!(
                    table = entry.table(),
                    error = %e,
                    "날짜 조회 실패, 합집합에서 제외"
                );
            }
        }
    }

    let all_dates = union_dates(per_table);
    if all_dates.is_empty() {
        tracing::info!("어느 테이블에도 날짜가 없어 보정을 건너뜁니다");
        return ReconcileOutcome::NoDates;
    }

    tracing::info!(
        dates = all_dates.len(),
        first = %all_dates[0],
        last = %all_dates[all_dates.len() - 1],
        "날짜 보정 시작"
    );

    // 2. 테이블별 forward-fill
    let mut stats = CollectionStats::new();
    for entry in registry.iter() {
        stats.total += 1;

        let bars = match store.load_bars(entry.table(), entry.schema()).await {
            Ok(bars) => bars,
            Err(e) => {
                stats.errors += 1;
                tracing::error!(table = entry.table(), error = %e, "테이블 조회 실패");
                continue;
            }
        };

        if bars.is_empty() {
            stats.empty += 1;
            tracing::debug!(table = entry.table(), "빈 테이블, 채울 기준값 없음");
            continue;
        }

        let filled = missing_rows(&bars, &all_dates);
        if filled.is_empty() {
            stats.success += 1;
            tracing::debug!(table = entry.table(), "누락 날짜 없음");
            continue;
        }

        match store
            .upsert_bars(entry.table(), entry.schema(), &filled)
            .await
        {
            Ok(written) => {
                stats.success += 1;
                stats.total_rows += written;
                tracing::info!(
                    table = entry.table(),
                    filled = written,
                    total = bars.len() + filled.len(),
                    "누락 날짜 보정 완료"
                );
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(table = entry.table(), error = %e, "누락 날짜 저장 실패");
            }
        }
    }

    stats.elapsed = start.elapsed();
    ReconcileOutcome::Reconciled(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SymbolEntry;
    use chrono::NaiveDate;
    use index_data::{MemoryIndexStore, PriceBar, TableSchema};
    use rust_decimal::Decimal;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn bar(d: u32, close: i64) -> PriceBar {
        let price = Decimal::from(close);
        PriceBar {
            date: day(d),
            open: price,
            high: price,
            low: price,
            close: price,
            adjusted_close: price,
            volume: None,
        }
    }

    fn registry() -> SymbolRegistry {
        SymbolRegistry::new(vec![
            SymbolEntry::new("A").with_table("Table_A"),
            SymbolEntry::new("B").with_table("Table_B"),
        ])
        .unwrap()
    }

    fn dates(rows: &[PriceBar]) -> Vec<NaiveDate> {
        rows.iter().map(|b| b.date).collect()
    }

    #[tokio::test]
    async fn test_fill_two_tables_to_union() {
        let schema = TableSchema::without_volume();
        let store = MemoryIndexStore::new()
            .with_rows("Table_A", schema, vec![bar(1, 10), bar(2, 20), bar(4, 40)])
            .with_rows("Table_B", schema, vec![bar(1, 100), bar(3, 300), bar(4, 400)]);

        let outcome = fill_missing_dates(&store, &registry()).await;
        let ReconcileOutcome::Reconciled(stats) = outcome else {
            panic!("expected reconciliation");
        };
        assert_eq!(stats.total, 2);
        assert_eq!(stats.success, 2);
        assert_eq!(stats.total_rows, 2);

        let a = store.rows("Table_A");
        let b = store.rows("Table_B");
        let union = vec![day(1), day(2), day(3), day(4)];
        assert_eq!(dates(&a), union);
        assert_eq!(dates(&b), union);

        assert_eq!(a[2], bar(2, 20).carried_to(day(3)));
        assert_eq!(b[1], bar(1, 100).carried_to(day(2)));
    }

    #[tokio::test]
    async fn test_empty_union_is_noop() {
        let schema = TableSchema::without_volume();
        let store = MemoryIndexStore::new()
            .with_rows("Table_A", schema, Vec::new())
            .with_rows("Table_B", schema, Vec::new());

        let outcome = fill_missing_dates(&store, &registry()).await;

        assert!(matches!(outcome, ReconcileOutcome::NoDates));
        assert_eq!(store.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_second_pass_writes_nothing() {
        let schema = TableSchema::without_volume();
        let store = MemoryIndexStore::new()
            .with_rows("Table_A", schema, vec![bar(1, 10), bar(3, 30)])
            .with_rows("Table_B", schema, vec![bar(2, 200), bar(3, 300)]);

        fill_missing_dates(&store, &registry()).await;
        let writes = store.write_calls();
        fill_missing_dates(&store, &registry()).await;

        assert_eq!(store.write_calls(), writes);
        // B는 1일 이전 값이 없으므로 1일은 채우지 않음
        assert_eq!(dates(&store.rows("Table_B")), vec![day(2), day(3)]);
        assert_eq!(dates(&store.rows("Table_A")), vec![day(1), day(2), day(3)]);
    }

    #[tokio::test]
    async fn test_one_failing_table_does_not_block_others() {
        let schema = TableSchema::without_volume();
        let store = MemoryIndexStore::new()
            .with_rows("Table_A", schema, vec![bar(1, 10), bar(3, 30)])
            .with_rows("Table_B", schema, vec![bar(2, 200)])
            .with_failing_table("Table_B");

        let ReconcileOutcome::Reconciled(stats) = fill_missing_dates(&store, &registry()).await
        else {
            panic!("expected reconciliation");
        };

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.success, 1);
        // B의 날짜는 합집합에서 빠지므로 A는 1, 3일만 유지
        assert_eq!(dates(&store.rows("Table_A")), vec![day(1), day(3)]);
    }
}
