//! 테스트용 스크립트 제공자.
//!
//! 심볼별로 미리 등록한 응답을 돌려주고 호출 이력을 기록합니다.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::MarketDataProvider;
use crate::error::{DataError, Result};
use crate::types::{FetchMode, PriceBar};

/// 모드별 응답 스크립트.
#[derive(Debug, Clone, Default)]
struct Script {
    full_history: Option<std::result::Result<Vec<PriceBar>, String>>,
    latest_day: Option<std::result::Result<Vec<PriceBar>, String>>,
}

/// 등록된 응답을 반환하는 제공자.
///
/// 등록되지 않은 심볼/모드는 빈 결과를 반환합니다.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<(String, FetchMode)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 전체 이력 응답 등록.
    pub fn with_history(self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.script(ticker, |s| s.full_history = Some(Ok(bars)));
        self
    }

    /// 최근 거래일 응답 등록.
    pub fn with_latest(self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.script(ticker, |s| s.latest_day = Some(Ok(bars)));
        self
    }

    /// 모든 모드에서 실패하도록 등록.
    pub fn with_failure(self, ticker: &str, message: &str) -> Self {
        self.script(ticker, |s| {
            s.full_history = Some(Err(message.to_string()));
            s.latest_day = Some(Err(message.to_string()));
        });
        self
    }

    /// 지금까지의 호출 이력 (심볼, 모드).
    pub fn calls(&self) -> Vec<(String, FetchMode)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn script(&self, ticker: &str, f: impl FnOnce(&mut Script)) {
        if let Ok(mut scripts) = self.scripts.lock() {
            f(scripts.entry(ticker.to_string()).or_default());
        }
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    async fn fetch_bars(&self, ticker: &str, mode: FetchMode) -> Result<Vec<PriceBar>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((ticker.to_string(), mode));
        }

        let scripts = self
            .scripts
            .lock()
            .map_err(|e| DataError::ProviderError(e.to_string()))?;

        let entry = scripts.get(ticker).and_then(|s| match mode {
            FetchMode::FullHistory { .. } => s.full_history.clone(),
            FetchMode::LatestDay => s.latest_day.clone(),
        });

        match entry {
            Some(Ok(bars)) => Ok(bars),
            Some(Err(message)) => Err(DataError::ProviderError(message)),
            None => Ok(Vec::new()),
        }
    }
}
