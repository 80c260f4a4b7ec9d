//! 지수 일봉 수집 모듈.

use index_data::{FetchMode, IndexStore, MarketDataProvider};

use crate::registry::SymbolEntry;
use crate::Result;

/// 일봉 수집 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 저장(upsert)된 행 수
    Stored(usize),
    /// 제공자 응답이 비어 있음 (휴장일, 상장폐지, 장애 등)
    Empty,
}

/// 일봉을 조회하여 지수 테이블에 upsert.
///
/// 빈 응답은 에러가 아니며 테이블을 변경하지 않습니다.
pub async fn fetch_and_store(
    store: &dyn IndexStore,
    provider: &dyn MarketDataProvider,
    entry: &SymbolEntry,
    mode: FetchMode,
) -> Result<FetchOutcome> {
    tracing::info!(
        symbol = entry.ticker(),
        table = entry.table(),
        mode = %mode,
        "일봉 조회 시작"
    );

    let bars = provider.fetch_bars(entry.ticker(), mode).await?;

    if bars.is_empty() {
        tracing::info!(symbol = entry.ticker(), "데이터 없음, 건너뜀");
        return Ok(FetchOutcome::Empty);
    }

    let schema = entry.schema();
    let bars: Vec<_> = bars.into_iter().map(|b| schema.conform(b)).collect();

    if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
        tracing::debug!(
            symbol = entry.ticker(),
            rows = bars.len(),
            first = %first.date,
            last = %last.date,
            "일봉 수신"
        );
    }

    let stored = store.upsert_bars(entry.table(), schema, &bars).await?;

    tracing::info!(
        symbol = entry.ticker(),
        table = entry.table(),
        rows = stored,
        "저장 완료"
    );

    Ok(FetchOutcome::Stored(stored))
}
