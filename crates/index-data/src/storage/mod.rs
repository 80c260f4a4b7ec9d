//! 지수별 테이블 저장소.
//!
//! 지수 하나가 테이블 하나에 대응하며, 테이블은 `date`를 기본 키로 가집니다.

pub mod database;
pub mod index_table;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use database::{Database, DatabaseConfig};
pub use index_table::PgIndexStore;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::types::{PriceBar, TableSchema};

/// PostgreSQL 식별자 최대 길이.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// 지수 테이블 저장소 trait.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// 테이블이 없으면 생성 (이미 있으면 아무것도 하지 않음).
    async fn ensure_table(&self, table: &str, schema: TableSchema) -> Result<()>;

    /// 테이블의 행 수.
    async fn row_count(&self, table: &str) -> Result<i64>;

    /// 테이블에 데이터가 있는지 확인.
    async fn has_data(&self, table: &str) -> Result<bool> {
        Ok(self.row_count(table).await? > 0)
    }

    /// 날짜 기준 upsert. 영향받은 행 수를 반환합니다.
    async fn upsert_bars(&self, table: &str, schema: TableSchema, bars: &[PriceBar])
        -> Result<usize>;

    /// 전체 행을 날짜 오름차순으로 조회.
    async fn load_bars(&self, table: &str, schema: TableSchema) -> Result<Vec<PriceBar>>;

    /// 저장된 날짜 목록 (오름차순).
    async fn load_dates(&self, table: &str) -> Result<Vec<NaiveDate>>;
}

/// 테이블 이름으로 사용할 수 있는 식별자인지 확인.
///
/// 영문자 또는 `_`로 시작하고 영숫자/`_`로만 구성되어야 합니다.
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');

    starts_ok
        && name.len() <= MAX_IDENTIFIER_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// 식별자를 큰따옴표로 감쌉니다 (대소문자 보존).
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
