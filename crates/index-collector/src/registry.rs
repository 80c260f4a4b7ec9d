//! 수집 대상 지수 레지스트리.
//!
//! 제공자 심볼(예: "^GSPC")과 저장 테이블 이름(예: "GSPC")의 고정 매핑입니다.
//! 시작 시 한 번 검증하며 실행 중에는 바뀌지 않습니다.
//!
//! # 기본 레지스트리
//!
//! | 심볼 | 테이블 | volume |
//! |------|--------|--------|
//! | `^GSPC` | `GSPC` | - |
//! | `^DJI` | `DJI` | - |
//! | `^IXIC` | `IXIC` | - |
//! | `^RUT` | `RUT` | - |
//! | `^VIX` | `VIX` | - |
//! | `ES=F` | `E_Mini_SP_500` | O |

use index_data::storage::is_valid_table_name;
use index_data::TableSchema;
use std::collections::HashMap;

use crate::error::CollectorError;
use crate::Result;

/// 레지스트리 항목: 제공자 심볼 → 테이블 이름.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    ticker: String,
    table: String,
    schema: TableSchema,
}

impl SymbolEntry {
    /// 심볼에서 테이블 이름을 유도하여 생성 (volume 없음).
    pub fn new(ticker: impl Into<String>) -> Self {
        let ticker = ticker.into();
        let table = sanitize_table_name(&ticker);
        Self {
            ticker,
            table,
            schema: TableSchema::without_volume(),
        }
    }

    /// 테이블 이름을 직접 지정.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// volume 컬럼 포함.
    pub fn with_volume(mut self) -> Self {
        self.schema = TableSchema::with_volume();
        self
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> TableSchema {
        self.schema
    }
}

/// 제공자 심볼을 테이블 이름으로 변환.
///
/// 앞의 지수 표시(`^`)를 제거하고, 하이픈 등 식별자에 쓸 수 없는 문자는 `_`로 바꿉니다.
/// 숫자로 시작하면 앞에 `_`를 붙입니다.
pub fn sanitize_table_name(ticker: &str) -> String {
    let mut name: String = ticker
        .trim()
        .trim_start_matches('^')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// 검증된 심볼 레지스트리 (선언 순서 유지).
#[derive(Debug, Clone)]
pub struct SymbolRegistry {
    entries: Vec<SymbolEntry>,
}

impl SymbolRegistry {
    /// 레지스트리 생성 및 검증.
    ///
    /// 비어 있거나, 테이블 이름이 식별자로 부적합하거나, 심볼이 중복되거나,
    /// 두 항목이 같은 테이블 이름(대소문자 무시)으로 변환되면 `Config` 에러.
    pub fn new(entries: Vec<SymbolEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(CollectorError::Config(
                "수집할 지수가 없습니다".to_string(),
            ));
        }

        let mut tickers: HashMap<&str, usize> = HashMap::new();
        let mut tables: HashMap<String, &str> = HashMap::new();

        for (idx, entry) in entries.iter().enumerate() {
            if !is_valid_table_name(&entry.table) {
                return Err(CollectorError::Config(format!(
                    "{}: 테이블 이름으로 사용할 수 없습니다 ({:?})",
                    entry.ticker, entry.table
                )));
            }

            if tickers.insert(entry.ticker.as_str(), idx).is_some() {
                return Err(CollectorError::Config(format!(
                    "중복된 심볼: {}",
                    entry.ticker
                )));
            }

            if let Some(other) = tables.insert(entry.table.to_ascii_lowercase(), &entry.ticker) {
                return Err(CollectorError::Config(format!(
                    "테이블 이름 충돌: {} 와 {} 가 모두 {} 로 변환됩니다",
                    other, entry.ticker, entry.table
                )));
            }
        }

        Ok(Self { entries })
    }

    /// 기본 지수 레지스트리.
    pub fn default_indices() -> Result<Self> {
        Self::new(vec![
            SymbolEntry::new("^GSPC"),
            SymbolEntry::new("^DJI"),
            SymbolEntry::new("^IXIC"),
            SymbolEntry::new("^RUT"),
            SymbolEntry::new("^VIX"),
            SymbolEntry::new("ES=F")
                .with_table("E_Mini_SP_500")
                .with_volume(),
        ])
    }

    /// `TICKER[:TABLE][+volume]` 항목을 쉼표로 구분한 문자열에서 생성.
    ///
    /// 예: `"ES=F:E_Mini_SP_500+volume,^GSPC"`
    pub fn parse(spec: &str) -> Result<Self> {
        let entries = spec
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                let (item, volume) = match item.strip_suffix("+volume") {
                    Some(rest) => (rest, true),
                    None => (item, false),
                };

                let entry = match item.split_once(':') {
                    Some((ticker, table)) => {
                        SymbolEntry::new(ticker.trim()).with_table(table.trim())
                    }
                    None => SymbolEntry::new(item),
                };

                if volume {
                    entry.with_volume()
                } else {
                    entry
                }
            })
            .collect();

        Self::new(entries)
    }

    /// 심볼의 테이블 이름.
    pub fn table_name(&self, ticker: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.ticker == ticker)
            .map(|e| e.table.as_str())
    }

    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
