//! 시장 지수 일봉 수집기.
//!
//! 이 crate는 cron 등으로 하루 한 번 실행되는 수집 바이너리를 제공합니다:
//! - 지수별 테이블 초기화 및 데이터 존재 확인
//! - 빈 테이블은 전체 이력, 데이터가 있으면 최근 거래일 수집
//! - (선택) 테이블 간 누락 날짜 forward-fill

pub mod config;
pub mod error;
pub mod logging;
pub mod modules;
pub mod registry;
pub mod stats;

pub use config::{CollectorConfig, ProbeFailurePolicy};
pub use error::{CollectorError, Result};
pub use registry::{SymbolEntry, SymbolRegistry};
pub use stats::CollectionStats;
