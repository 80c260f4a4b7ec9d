//! 지수 테이블 초기화 및 데이터 존재 확인.

use index_data::IndexStore;

use crate::config::ProbeFailurePolicy;
use crate::registry::SymbolEntry;

/// 데이터 존재 확인 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 데이터 있음 → 최근 거래일만 수집
    HasData,
    /// 데이터 없음 (또는 확인 실패 후 재수집 정책) → 전체 이력 수집
    Empty,
    /// 확인 실패 후 skip 정책 → 이번 실행에서 제외
    Skip,
}

/// 지수 테이블이 없으면 생성.
///
/// 실패해도 에러를 올리지 않고 로그만 남깁니다. 반환값은 성공 여부입니다.
pub async fn initialize_table(store: &dyn IndexStore, entry: &SymbolEntry) -> bool {
    match store.ensure_table(entry.table(), entry.schema()).await {
        Ok(()) => {
            tracing::info!(
                symbol = entry.ticker(),
                table = entry.table(),
                volume = entry.schema().include_volume,
                "테이블 초기화 완료"
            );
            true
        }
        Err(e) => {
            tracing::error!(
                symbol = entry.ticker(),
                table = entry.table(),
                error = %e,
                "테이블 초기화 실패"
            );
            false
        }
    }
}

/// 테이블에 데이터가 있는지 확인.
///
/// 확인 실패 시 처리는 `policy`를 따릅니다.
pub async fn probe_table(
    store: &dyn IndexStore,
    entry: &SymbolEntry,
    policy: ProbeFailurePolicy,
) -> ProbeOutcome {
    match store.has_data(entry.table()).await {
        Ok(true) => ProbeOutcome::HasData,
        Ok(false) => ProbeOutcome::Empty,
        Err(e) => {
            tracing::warn!(
                symbol = entry.ticker(),
                table = entry.table(),
                error = %e,
                policy = ?policy,
                "데이터 존재 확인 실패"
            );
            match policy {
                ProbeFailurePolicy::FullRefetch => ProbeOutcome::Empty,
                ProbeFailurePolicy::Skip => ProbeOutcome::Skip,
            }
        }
    }
}
