//! 환경변수 기반 설정 모듈.
//!
//! 시작 시 한 번 로드/검증하고 각 단계에 참조로 전달합니다.
//! 필수 값(`DB_HOST`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`)이 없거나
//! 값 형식이 잘못되면 `CollectorError::Config`로 즉시 실패합니다.

use chrono::NaiveDate;
use index_data::DatabaseConfig;
use secrecy::SecretString;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CollectorError;
use crate::registry::SymbolRegistry;
use crate::Result;

/// 전체 이력 기본 시작일.
pub const DEFAULT_HISTORY_START: &str = "1998-02-26";

/// Collector 전체 설정
#[derive(Debug)]
pub struct CollectorConfig {
    /// 데이터베이스 접속 정보
    pub database: DatabaseConfig,
    /// 일봉 수집 설정
    pub fetch: FetchConfig,
    /// 날짜 보정 설정
    pub reconcile: ReconcileConfig,
    /// 수집 대상 지수
    pub registry: SymbolRegistry,
}

/// 일봉 수집 설정
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// 전체 이력 시작일
    pub history_start: NaiveDate,
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// 데이터 존재 확인 실패 시 처리 방식
    pub probe_failure: ProbeFailurePolicy,
}

/// 날짜 보정 설정
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// 수집 후 누락 날짜 forward-fill 실행 여부
    pub fill_missing_dates: bool,
}

/// 데이터 존재 확인(COUNT) 실패 시 처리 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeFailurePolicy {
    /// 데이터 없음으로 간주하고 전체 이력 재수집
    #[default]
    FullRefetch,
    /// 이번 실행에서 해당 지수 건너뜀
    Skip,
}

impl FromStr for ProbeFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full_refetch" | "refetch" => Ok(Self::FullRefetch),
            "skip" => Ok(Self::Skip),
            _ => Err(format!("Unknown probe failure policy: {}", s)),
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드 (`.env` 파일이 있으면 먼저 읽음)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로부터 설정 로드.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig {
            host: required(&lookup, "DB_HOST")?,
            port: parse_or(&lookup, "DB_PORT", 5432)?,
            user: required(&lookup, "DB_USER")?,
            password: SecretString::new(
                lookup("DB_PASSWORD")
                    .ok_or_else(|| missing("DB_PASSWORD"))?
                    .into(),
            ),
            database: required(&lookup, "DB_NAME")?,
            connect_timeout_secs: parse_or(&lookup, "DB_CONNECT_TIMEOUT_SECS", 5)?,
        };

        let history_start = match lookup("HISTORY_START_DATE") {
            Some(v) => NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").map_err(|e| {
                CollectorError::Config(format!("HISTORY_START_DATE 형식 오류 ({}): {}", v, e))
            })?,
            None => NaiveDate::parse_from_str(DEFAULT_HISTORY_START, "%Y-%m-%d")
                .map_err(|e| CollectorError::Config(e.to_string()))?,
        };

        let registry = match lookup("INDEX_SYMBOLS") {
            Some(spec) if !spec.trim().is_empty() => SymbolRegistry::parse(&spec)?,
            _ => SymbolRegistry::default_indices()?,
        };

        Ok(Self {
            database,
            fetch: FetchConfig {
                history_start,
                request_delay_ms: parse_or(&lookup, "REQUEST_DELAY_MS", 500)?,
                probe_failure: parse_or(&lookup, "PROBE_FAILURE_POLICY", ProbeFailurePolicy::default())?,
            },
            reconcile: ReconcileConfig {
                fill_missing_dates: bool_or(&lookup, "FILL_MISSING_DATES", false)?,
            },
            registry,
        })
    }
}

impl FetchConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

fn missing(key: &str) -> CollectorError {
    CollectorError::Config(format!("{} 환경변수가 설정되지 않았습니다", key))
}

/// 필수 값 (비어 있으면 누락으로 간주)
fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(key))
}

/// 값을 파싱 (없으면 기본값, 형식 오류는 Config 에러)
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| CollectorError::Config(format!("{} 형식 오류 ({}): {}", key, v, e))),
        None => Ok(default),
    }
}

/// bool 값 파싱 (true/false/1/0/yes/no)
fn bool_or<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        Some(v) if v == "true" || v == "1" || v == "yes" => Ok(true),
        Some(v) if v == "false" || v == "0" || v == "no" => Ok(false),
        Some(v) => Err(CollectorError::Config(format!(
            "{} 형식 오류: {}",
            key, v
        ))),
        None => Ok(default),
    }
}
