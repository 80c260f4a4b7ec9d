//! 일봉 데이터 도메인 타입.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 한 지수의 하루치 가격 데이터.
///
/// 테이블 내에서 `date`가 기본 키입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    /// 거래일
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// 수정 종가 (배당/분할 반영)
    pub adjusted_close: Decimal,
    /// 거래량 (스키마에 volume 컬럼이 없는 지수는 None)
    pub volume: Option<i64>,
}

impl PriceBar {
    /// 같은 가격 데이터를 다른 날짜로 복사 (forward-fill용).
    pub fn carried_to(&self, date: NaiveDate) -> Self {
        Self {
            date,
            ..self.clone()
        }
    }
}

/// 수집 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// 기준일부터 오늘까지 전체 이력
    FullHistory { since: NaiveDate },
    /// 가장 최근 거래일 1개
    LatestDay,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullHistory { since } => write!(f, "full_history(since {})", since),
            Self::LatestDay => write!(f, "latest_day"),
        }
    }
}

/// 지수 테이블 스키마.
///
/// 공통 컬럼은 `date, open, high, low, close, adjusted_close`이고
/// `include_volume`이면 `volume` 컬럼이 추가됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableSchema {
    pub include_volume: bool,
}

impl TableSchema {
    pub const fn with_volume() -> Self {
        Self {
            include_volume: true,
        }
    }

    pub const fn without_volume() -> Self {
        Self {
            include_volume: false,
        }
    }

    /// 스키마에 맞게 바를 정규화 (volume 컬럼이 없으면 제거).
    pub fn conform(&self, mut bar: PriceBar) -> PriceBar {
        if !self.include_volume {
            bar.volume = None;
        }
        bar
    }
}
