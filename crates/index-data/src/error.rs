//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류 (연결 타임아웃 포함)
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 시세 제공자 오류 (요청 실패 또는 사용할 수 없는 응답)
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// 테이블 생성 오류
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
                DataError::ConnectionError(err.to_string())
            }
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_connection_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: DataError = sqlx::Error::Io(io).into();
        assert!(matches!(err, DataError::ConnectionError(_)));
    }

    #[test]
    fn test_row_not_found_maps_to_query_error() {
        let err: DataError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DataError::QueryError(_)));
    }
}
