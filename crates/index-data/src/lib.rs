//! 지수 일봉 데이터 관리.
//!
//! 이 crate는 다음을 제공합니다:
//! - 일봉 도메인 타입 (`PriceBar`, `FetchMode`, `TableSchema`)
//! - Yahoo Finance 시세 제공자
//! - 지수별 PostgreSQL 테이블 저장소 (작업 단위 연결, 날짜 기준 upsert)
//! - 테이블 간 날짜 정렬 및 forward-fill

pub mod error;
pub mod provider;
pub mod reconcile;
pub mod storage;
pub mod types;

pub use error::{DataError, Result};
pub use types::{FetchMode, PriceBar, TableSchema};

// 제공자 재내보내기
pub use provider::{MarketDataProvider, YahooIndexProvider};

// 저장소 재내보내기
pub use storage::{Database, DatabaseConfig, IndexStore, PgIndexStore};

#[cfg(any(test, feature = "test-util"))]
pub use provider::scripted::ScriptedProvider;
#[cfg(any(test, feature = "test-util"))]
pub use storage::memory::MemoryIndexStore;
