//! 전체 수집 워크플로우.
//!
//! 지수마다 테이블 초기화 → 데이터 존재 확인 → 일봉 수집 순서로 처리하고,
//! 설정에 따라 마지막에 누락 날짜 보정을 실행합니다.

use index_data::{FetchMode, IndexStore, MarketDataProvider};
use std::time::Instant;

use super::date_fill::{fill_missing_dates, ReconcileOutcome};
use super::ohlcv_collect::{fetch_and_store, FetchOutcome};
use super::table_init::{initialize_table, probe_table, ProbeOutcome};
use crate::{CollectionStats, CollectorConfig};

/// 워크플로우 실행 결과.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    /// 일봉 수집 통계
    pub collection: CollectionStats,
    /// 날짜 보정 결과 (비활성화 시 None)
    pub reconcile: Option<ReconcileOutcome>,
}

impl WorkflowReport {
    /// 수집과 날짜 보정 통계를 합산한 전체 통계.
    pub fn combined(&self) -> CollectionStats {
        let mut total = self.collection.clone();
        if let Some(ReconcileOutcome::Reconciled(stats)) = &self.reconcile {
            total.merge(stats);
        }
        total
    }
}

/// 등록된 모든 지수의 일봉 수집.
///
/// 레지스트리 순서대로 하나씩 처리하며, 한 지수의 실패가
/// 다른 지수 처리를 멈추지 않습니다.
pub async fn collect_indices(
    store: &dyn IndexStore,
    provider: &dyn MarketDataProvider,
    config: &CollectorConfig,
) -> CollectionStats {
    let start = Instant::now();
    let mut stats = CollectionStats::new();
    let registry = &config.registry;

    tracing::info!(indices = registry.len(), "지수 수집 시작");

    for (idx, entry) in registry.iter().enumerate() {
        stats.total += 1;

        tracing::debug!(
            symbol = entry.ticker(),
            progress = format!("{}/{}", idx + 1, registry.len()),
            "처리 시작"
        );

        // 테이블 생성 실패는 확인 단계에서 다시 드러나므로 계속 진행
        initialize_table(store, entry).await;

        let mode = match probe_table(store, entry, config.fetch.probe_failure).await {
            ProbeOutcome::HasData => FetchMode::LatestDay,
            ProbeOutcome::Empty => FetchMode::FullHistory {
                since: config.fetch.history_start,
            },
            ProbeOutcome::Skip => {
                stats.skipped += 1;
                continue;
            }
        };

        match fetch_and_store(store, provider, entry, mode).await {
            Ok(FetchOutcome::Stored(rows)) => {
                stats.success += 1;
                stats.total_rows += rows;
            }
            Ok(FetchOutcome::Empty) => {
                stats.empty += 1;
            }
            Err(e) => {
                stats.errors += 1;
                tracing::error!(
                    symbol = entry.ticker(),
                    table = entry.table(),
                    error = %e,
                    "수집 실패"
                );
            }
        }

        // Rate limiting
        if idx + 1 < registry.len() && config.fetch.request_delay_ms > 0 {
            tokio::time::sleep(config.fetch.request_delay()).await;
        }
    }

    stats.elapsed = start.elapsed();
    stats
}

/// 전체 워크플로우 실행 (수집 → 선택적 날짜 보정).
pub async fn run(
    store: &dyn IndexStore,
    provider: &dyn MarketDataProvider,
    config: &CollectorConfig,
) -> WorkflowReport {
    tracing::info!("=== 전체 워크플로우 시작 ===");

    let collection = collect_indices(store, provider, config).await;
    collection.log_summary("지수 수집");

    let reconcile = if config.reconcile.fill_missing_dates {
        let outcome = fill_missing_dates(store, &config.registry).await;
        if let ReconcileOutcome::Reconciled(stats) = &outcome {
            stats.log_summary("날짜 보정");
        }
        Some(outcome)
    } else {
        tracing::debug!("날짜 보정 비활성화 (FILL_MISSING_DATES=false)");
        None
    };

    let report = WorkflowReport {
        collection,
        reconcile,
    };
    report.combined().log_summary("전체 워크플로우");

    report
}
