//! 시세 제공자 모듈.
//!
//! 외부 시세 소스에서 일봉 데이터를 가져오는 Provider들을 정의합니다.
//!
//! ## Yahoo Finance
//! - `YahooIndexProvider`: 지수/선물 일봉 조회 (전체 이력, 최근 거래일)
//!
//! 모든 Provider는 응답을 [`ProviderRow`]로 받은 뒤 [`normalize_rows`]를 거쳐
//! 저장 스키마와 같은 순서의 [`PriceBar`]로 변환합니다.

pub mod yahoo;

#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

pub use yahoo::YahooIndexProvider;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::error::{DataError, Result};
use crate::types::{FetchMode, PriceBar};

/// 가격 저장 시 소수점 자리수.
pub const PRICE_SCALE: u32 = 6;

/// 시세 제공자 trait.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 일봉 데이터 조회.
    ///
    /// # 인자
    /// * `ticker` - 제공자 형식 심볼 (예: "^GSPC", "ES=F")
    /// * `mode` - 전체 이력 또는 최근 거래일
    ///
    /// 결과는 날짜 오름차순이며 날짜당 최대 1개입니다.
    /// 데이터가 없으면 빈 벡터를 반환합니다 (에러 아님).
    async fn fetch_bars(&self, ticker: &str, mode: FetchMode) -> Result<Vec<PriceBar>>;
}

/// 제공자 응답의 한 행 (정규화 전).
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// 제공자의 "Adj Close" 필드
    pub adj_close: f64,
    pub volume: Option<u64>,
}

/// 제공자 응답을 저장 형식으로 정규화.
///
/// - 날짜 오름차순 정렬, 중복 날짜는 마지막 행 우선
/// - `LatestDay` 모드는 가장 최근 거래일만 남김
/// - 유한하지 않은 가격은 `ProviderError`
pub fn normalize_rows(ticker: &str, rows: Vec<ProviderRow>, mode: FetchMode) -> Result<Vec<PriceBar>> {
    let mut by_date: BTreeMap<NaiveDate, PriceBar> = BTreeMap::new();

    for row in rows {
        let bar = PriceBar {
            date: row.date,
            open: to_price(ticker, row.date, "open", row.open)?,
            high: to_price(ticker, row.date, "high", row.high)?,
            low: to_price(ticker, row.date, "low", row.low)?,
            close: to_price(ticker, row.date, "close", row.close)?,
            adjusted_close: to_price(ticker, row.date, "adjusted_close", row.adj_close)?,
            volume: row.volume.map(|v| i64::try_from(v).unwrap_or(i64::MAX)),
        };
        by_date.insert(bar.date, bar);
    }

    let mut bars: Vec<PriceBar> = by_date.into_values().collect();

    if mode == FetchMode::LatestDay && bars.len() > 1 {
        bars = bars.split_off(bars.len() - 1);
    }

    Ok(bars)
}

fn to_price(ticker: &str, date: NaiveDate, field: &str, value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(DataError::ProviderError(format!(
            "{} {}: {} 값이 유효하지 않습니다 ({})",
            ticker, date, field, value
        )));
    }

    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(PRICE_SCALE).normalize())
        .ok_or_else(|| {
            DataError::InvalidData(format!(
                "{} {}: {} 값을 Decimal로 변환할 수 없습니다 ({})",
                ticker, date, field, value
            ))
        })
}
