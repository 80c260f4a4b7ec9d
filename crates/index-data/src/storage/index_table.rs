//! PostgreSQL 지수 테이블 저장소.
//!
//! # 테이블 구조
//!
//! ```text
//! "<table>" (
//!     date            DATE PRIMARY KEY,
//!     open            NUMERIC NOT NULL,
//!     high            NUMERIC NOT NULL,
//!     low             NUMERIC NOT NULL,
//!     close           NUMERIC NOT NULL,
//!     adjusted_close  NUMERIC NOT NULL,
//!     volume          BIGINT            -- volume 스키마만
//! )
//! ```
//!
//! 모든 쓰기는 `ON CONFLICT (date) DO UPDATE`로 처리하므로
//! 같은 날짜를 다시 저장해도 행이 중복되지 않습니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::FromRow;
use tracing::{debug, info, instrument};

use super::database::Database;
use super::{is_valid_table_name, quote_ident, IndexStore};
use crate::error::{DataError, Result};
use crate::types::{PriceBar, TableSchema};

/// 한 번에 upsert할 최대 행 수.
const UPSERT_CHUNK_SIZE: usize = 500;

/// 지수 테이블 레코드.
#[derive(Debug, Clone, FromRow)]
struct PriceBarRecord {
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    adjusted_close: Decimal,
    volume: Option<i64>,
}

impl From<PriceBarRecord> for PriceBar {
    fn from(r: PriceBarRecord) -> Self {
        PriceBar {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            adjusted_close: r.adjusted_close,
            volume: r.volume,
        }
    }
}

/// PostgreSQL 기반 지수 테이블 저장소.
#[derive(Debug, Clone)]
pub struct PgIndexStore {
    db: Database,
}

impl PgIndexStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn checked_ident(table: &str) -> Result<String> {
        if !is_valid_table_name(table) {
            return Err(DataError::InvalidData(format!(
                "허용되지 않는 테이블 이름: {}",
                table
            )));
        }
        Ok(quote_ident(table))
    }
}

/// CREATE TABLE 문 생성.
fn create_table_sql(ident: &str, schema: TableSchema) -> String {
    let volume = if schema.include_volume {
        ",\n    volume BIGINT"
    } else {
        ""
    };

    format!(
        "CREATE TABLE IF NOT EXISTS {} (
    date DATE PRIMARY KEY,
    open NUMERIC NOT NULL,
    high NUMERIC NOT NULL,
    low NUMERIC NOT NULL,
    close NUMERIC NOT NULL,
    adjusted_close NUMERIC NOT NULL{}
)",
        ident, volume
    )
}

/// UNNEST 기반 upsert 문 생성.
fn upsert_sql(ident: &str, schema: TableSchema) -> String {
    if schema.include_volume {
        format!(
            "INSERT INTO {} (date, open, high, low, close, adjusted_close, volume)
SELECT * FROM UNNEST(
    $1::date[], $2::numeric[], $3::numeric[], $4::numeric[], $5::numeric[], $6::numeric[],
    $7::int8[]
)
ON CONFLICT (date) DO UPDATE SET
    open = EXCLUDED.open,
    high = EXCLUDED.high,
    low = EXCLUDED.low,
    close = EXCLUDED.close,
    adjusted_close = EXCLUDED.adjusted_close,
    volume = EXCLUDED.volume",
            ident
        )
    } else {
        format!(
            "INSERT INTO {} (date, open, high, low, close, adjusted_close)
SELECT * FROM UNNEST(
    $1::date[], $2::numeric[], $3::numeric[], $4::numeric[], $5::numeric[], $6::numeric[]
)
ON CONFLICT (date) DO UPDATE SET
    open = EXCLUDED.open,
    high = EXCLUDED.high,
    low = EXCLUDED.low,
    close = EXCLUDED.close,
    adjusted_close = EXCLUDED.adjusted_close",
            ident
        )
    }
}

/// 전체 행 조회 문 생성. volume 컬럼이 없는 테이블은 NULL로 채웁니다.
fn select_sql(ident: &str, schema: TableSchema) -> String {
    let volume = if schema.include_volume {
        "volume"
    } else {
        "NULL::BIGINT AS volume"
    };

    format!(
        "SELECT date, open, high, low, close, adjusted_close, {} FROM {} ORDER BY date ASC",
        volume, ident
    )
}

#[async_trait]
impl IndexStore for PgIndexStore {
    #[instrument(skip(self))]
    async fn ensure_table(&self, table: &str, schema: TableSchema) -> Result<()> {
        let sql = create_table_sql(&Self::checked_ident(table)?, schema);

        let mut conn = self.db.connect().await?;
        let result = sqlx::query(&sql).execute(&mut conn).await;
        Database::release(conn).await;

        result.map_err(|e| DataError::SchemaError(format!("{}: {}", table, e)))?;

        debug!(table = table, "테이블 확인 완료");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn row_count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", Self::checked_ident(table)?);

        let mut conn = self.db.connect().await?;
        let result: std::result::Result<(i64,), sqlx::Error> =
            sqlx::query_as(&sql).fetch_one(&mut conn).await;
        Database::release(conn).await;

        Ok(result?.0)
    }

    #[instrument(skip(self, bars), fields(count = bars.len()))]
    async fn upsert_bars(
        &self,
        table: &str,
        schema: TableSchema,
        bars: &[PriceBar],
    ) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        let sql = upsert_sql(&Self::checked_ident(table)?, schema);
        let mut conn = self.db.connect().await?;
        let mut affected = 0usize;
        let mut outcome = Ok(());

        for chunk in bars.chunks(UPSERT_CHUNK_SIZE) {
            let dates: Vec<NaiveDate> = chunk.iter().map(|b| b.date).collect();
            let opens: Vec<Decimal> = chunk.iter().map(|b| b.open).collect();
            let highs: Vec<Decimal> = chunk.iter().map(|b| b.high).collect();
            let lows: Vec<Decimal> = chunk.iter().map(|b| b.low).collect();
            let closes: Vec<Decimal> = chunk.iter().map(|b| b.close).collect();
            let adj_closes: Vec<Decimal> = chunk.iter().map(|b| b.adjusted_close).collect();

            let mut query = sqlx::query(&sql)
                .bind(&dates)
                .bind(&opens)
                .bind(&highs)
                .bind(&lows)
                .bind(&closes)
                .bind(&adj_closes);

            if schema.include_volume {
                let volumes: Vec<Option<i64>> = chunk.iter().map(|b| b.volume).collect();
                query = query.bind(volumes);
            }

            match query.execute(&mut conn).await {
                Ok(result) => affected += result.rows_affected() as usize,
                Err(e) => {
                    outcome = Err(DataError::QueryError(format!("{} upsert 실패: {}", table, e)));
                    break;
                }
            }
        }

        Database::release(conn).await;
        outcome?;

        info!(table = table, rows = affected, "일봉 upsert 완료");
        Ok(affected)
    }

    #[instrument(skip(self))]
    async fn load_bars(&self, table: &str, schema: TableSchema) -> Result<Vec<PriceBar>> {
        let sql = select_sql(&Self::checked_ident(table)?, schema);

        let mut conn = self.db.connect().await?;
        let result: std::result::Result<Vec<PriceBarRecord>, sqlx::Error> =
            sqlx::query_as(&sql).fetch_all(&mut conn).await;
        Database::release(conn).await;

        Ok(result?.into_iter().map(PriceBar::from).collect())
    }

    #[instrument(skip(self))]
    async fn load_dates(&self, table: &str) -> Result<Vec<NaiveDate>> {
        let sql = format!(
            "SELECT date FROM {} ORDER BY date ASC",
            Self::checked_ident(table)?
        );

        let mut conn = self.db.connect().await?;
        let result: std::result::Result<Vec<(NaiveDate,)>, sqlx::Error> =
            sqlx::query_as(&sql).fetch_all(&mut conn).await;
        Database::release(conn).await;

        Ok(result?.into_iter().map(|(d,)| d).collect())
    }
}
