//! 인메모리 지수 테이블 저장소 (테스트용).
//!
//! PostgreSQL 저장소와 같은 의미를 따릅니다:
//! 없는 테이블 조회는 `QueryError`, 쓰기는 날짜 기준 upsert.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use super::IndexStore;
use crate::error::{DataError, Result};
use crate::types::{PriceBar, TableSchema};

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, (TableSchema, BTreeMap<NaiveDate, PriceBar>)>,
    failing: HashSet<String>,
    create_calls: usize,
    write_calls: usize,
}

/// 인메모리 저장소.
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    inner: Mutex<Inner>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 해당 테이블에 대한 모든 작업이 연결 오류로 실패하도록 설정.
    pub fn with_failing_table(self, table: &str) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing.insert(table.to_string());
        }
        self
    }

    /// 테이블을 미리 채워 둡니다.
    pub fn with_rows(self, table: &str, schema: TableSchema, bars: Vec<PriceBar>) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            let rows = bars.into_iter().map(|b| (b.date, schema.conform(b))).collect();
            inner.tables.insert(table.to_string(), (schema, rows));
        }
        self
    }

    /// 테이블 존재 여부.
    pub fn table_exists(&self, table: &str) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.tables.contains_key(table))
            .unwrap_or(false)
    }

    /// 테이블 전체 행 (날짜 오름차순).
    pub fn rows(&self, table: &str) -> Vec<PriceBar> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| {
                inner
                    .tables
                    .get(table)
                    .map(|(_, rows)| rows.values().cloned().collect())
            })
            .unwrap_or_default()
    }

    /// CREATE TABLE 호출 횟수.
    pub fn create_calls(&self) -> usize {
        self.inner.lock().map(|i| i.create_calls).unwrap_or(0)
    }

    /// upsert 호출 횟수.
    pub fn write_calls(&self) -> usize {
        self.inner.lock().map(|i| i.write_calls).unwrap_or(0)
    }

    fn lock(&self, table: &str) -> Result<std::sync::MutexGuard<'_, Inner>> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        if inner.failing.contains(table) {
            return Err(DataError::ConnectionError(format!(
                "connection refused ({})",
                table
            )));
        }
        Ok(inner)
    }
}

fn missing_table(table: &str) -> DataError {
    DataError::QueryError(format!("relation \"{}\" does not exist", table))
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn ensure_table(&self, table: &str, schema: TableSchema) -> Result<()> {
        let mut inner = self.lock(table)?;
        inner.create_calls += 1;
        inner
            .tables
            .entry(table.to_string())
            .or_insert_with(|| (schema, BTreeMap::new()));
        Ok(())
    }

    async fn row_count(&self, table: &str) -> Result<i64> {
        let inner = self.lock(table)?;
        inner
            .tables
            .get(table)
            .map(|(_, rows)| rows.len() as i64)
            .ok_or_else(|| missing_table(table))
    }

    async fn upsert_bars(
        &self,
        table: &str,
        schema: TableSchema,
        bars: &[PriceBar],
    ) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        let mut inner = self.lock(table)?;
        inner.write_calls += 1;
        let (_, rows) = inner
            .tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))?;

        for bar in bars {
            rows.insert(bar.date, schema.conform(bar.clone()));
        }
        Ok(bars.len())
    }

    async fn load_bars(&self, table: &str, _schema: TableSchema) -> Result<Vec<PriceBar>> {
        let inner = self.lock(table)?;
        inner
            .tables
            .get(table)
            .map(|(_, rows)| rows.values().cloned().collect())
            .ok_or_else(|| missing_table(table))
    }

    async fn load_dates(&self, table: &str) -> Result<Vec<NaiveDate>> {
        let inner = self.lock(table)?;
        inner
            .tables
            .get(table)
            .map(|(_, rows)| rows.keys().copied().collect())
            .ok_or_else(|| missing_table(table))
    }
}
