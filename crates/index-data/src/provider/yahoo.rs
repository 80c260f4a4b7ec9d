//! Yahoo Finance 지수 일봉 제공자.
//!
//! Yahoo Finance API를 사용하여 지수/선물의 일봉(OHLCV + Adj Close)을 조회합니다.
//!
//! # 조회 방식
//!
//! - **전체 이력**: 기준일 ~ 오늘, `1d` 간격 날짜 범위 조회
//! - **최근 거래일**: `5d` 범위를 조회한 뒤 마지막 거래일만 사용
//!   (주말/휴장일에도 직전 거래일이 잡히도록)
//!
//! # 심볼 형식
//!
//! Yahoo Finance 형식 그대로 전달합니다:
//! - 지수: "^GSPC", "^DJI", "^IXIC"
//! - 선물: "ES=F"

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use yahoo_finance_api as yahoo;

use super::{normalize_rows, MarketDataProvider, ProviderRow};
use crate::error::{DataError, Result};
use crate::types::{FetchMode, PriceBar};

/// 일봉 간격.
const DAILY_INTERVAL: &str = "1d";

/// 최근 거래일 조회 범위.
const LATEST_RANGE: &str = "5d";

/// Yahoo Finance 지수 일봉 제공자.
pub struct YahooIndexProvider {
    connector: yahoo::YahooConnector,
}

impl YahooIndexProvider {
    /// 새로운 Yahoo Finance 제공자 생성.
    pub fn new() -> Result<Self> {
        let connector = yahoo::YahooConnector::new().map_err(|e| {
            DataError::ProviderError(format!("Yahoo Finance 연결 실패: {}", e))
        })?;

        Ok(Self { connector })
    }

    /// Yahoo 응답을 정규화 전 행으로 변환.
    ///
    /// 타임스탬프는 거래소 시간대(서머타임 포함)를 적용하여 현지 거래일로 변환합니다.
    fn response_rows(ticker: &str, response: &yahoo::YResponse) -> Result<Vec<ProviderRow>> {
        let quotes = response.quotes().map_err(|e| {
            DataError::ProviderError(format!("Quote 파싱 오류 ({}): {}", ticker, e))
        })?;

        let tz = match response.metadata() {
            Ok(meta) => exchange_timezone(ticker, &meta.exchange_timezone_name),
            Err(e) => {
                warn!(ticker = ticker, error = %e, "메타데이터 없음, UTC 기준으로 날짜 변환");
                Tz::UTC
            }
        };

        quotes
            .iter()
            .map(|q| {
                let date = timestamp_to_trading_date(q.timestamp as i64, tz).ok_or_else(
                    || {
                        DataError::ProviderError(format!(
                            "{}: 잘못된 타임스탬프 {}",
                            ticker, q.timestamp
                        ))
                    },
                )?;

                Ok(ProviderRow {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    adj_close: q.adjclose,
                    volume: Some(q.volume as u64),
                })
            })
            .collect()
    }
}

#[async_trait]
impl MarketDataProvider for YahooIndexProvider {
    async fn fetch_bars(&self, ticker: &str, mode: FetchMode) -> Result<Vec<PriceBar>> {
        let response = match mode {
            FetchMode::FullHistory { since } => {
                // 종료일은 배타적이므로 내일까지 요청
                let until = Utc::now().date_naive() + Duration::days(1);
                info!(ticker = ticker, start = %since, end = %until, "Yahoo Finance 전체 이력 조회");

                self.connector
                    .get_quote_history_interval(
                        ticker,
                        naive_date_to_offset_datetime(since)?,
                        naive_date_to_offset_datetime(until)?,
                        DAILY_INTERVAL,
                    )
                    .await
            }
            FetchMode::LatestDay => {
                debug!(ticker = ticker, range = LATEST_RANGE, "Yahoo Finance 최근 거래일 조회");

                self.connector
                    .get_quote_range(ticker, DAILY_INTERVAL, LATEST_RANGE)
                    .await
            }
        }
        .map_err(|e| DataError::ProviderError(format!("Yahoo Finance API 오류 ({}): {}", ticker, e)))?;

        let rows = Self::response_rows(ticker, &response)?;
        if rows.is_empty() {
            warn!(ticker = ticker, "Yahoo Finance: 데이터 없음");
            return Ok(Vec::new());
        }

        debug!(ticker = ticker, rows = rows.len(), "Yahoo Finance 일봉 수신");

        normalize_rows(ticker, rows, mode)
    }
}

/// 거래소 시간대 이름(예: "America/New_York")을 `Tz`로 변환.
///
/// 알 수 없는 이름은 UTC로 처리합니다.
fn exchange_timezone(ticker: &str, name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!(ticker = ticker, timezone = name, "알 수 없는 거래소 시간대, UTC 사용");
        Tz::UTC
    })
}

/// Unix 타임스탬프를 거래소 현지 날짜로 변환.
fn timestamp_to_trading_date(timestamp: i64, tz: Tz) -> Option<NaiveDate> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.with_timezone(&tz).date_naive())
}

/// NaiveDate를 OffsetDateTime(UTC 자정)으로 변환.
fn naive_date_to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime> {
    let month = time::Month::try_from(date.month() as u8)
        .map_err(|e| DataError::InvalidData(format!("잘못된 월 ({}): {}", date, e)))?;

    time::Date::from_calendar_date(date.year(), month, date.day() as u8)
        .map(|d| d.midnight().assume_utc())
        .map_err(|e| DataError::InvalidData(format!("잘못된 날짜 ({}): {}", date, e)))
}
