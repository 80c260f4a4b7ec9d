//! PostgreSQL 연결 관리.
//!
//! 연결 풀 대신 작업 단위로 연결을 열고 닫습니다. 각 저장소 작업은
//! [`Database::connect`]로 연결을 얻고, 성공/실패와 관계없이
//! [`Database::release`]로 반환합니다.

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{DataError, Result};

/// 데이터베이스 설정.
#[derive(Debug)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub database: String,
    /// 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    /// 연결 타임아웃을 Duration으로 반환
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.database)
    }
}

/// 작업 단위 연결 팩토리.
#[derive(Debug, Clone)]
pub struct Database {
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl Database {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            options: config.connect_options(),
            connect_timeout: config.connect_timeout(),
        }
    }

    /// 새 연결을 엽니다 (타임아웃 적용).
    pub async fn connect(&self) -> Result<PgConnection> {
        let conn = tokio::time::timeout(self.connect_timeout, self.options.connect())
            .await
            .map_err(|_| {
                DataError::ConnectionError(format!(
                    "연결 타임아웃 ({}초)",
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        debug!("데이터베이스 연결 열림");
        Ok(conn)
    }

    /// 연결을 닫습니다. 종료 실패는 경고만 남깁니다.
    pub async fn release(conn: PgConnection) {
        if let Err(e) = conn.close().await {
            warn!(error = %e, "데이터베이스 연결 종료 실패");
        } else {
            debug!("데이터베이스 연결 닫힘");
        }
    }

    /// 연결 가능 여부 확인.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("SELECT 1").execute(&mut conn).await;
        Self::release(conn).await;

        result.map(|_| ()).map_err(DataError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DatabaseConfig {
        DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            user: "indices".to_string(),
            password: SecretString::new("hunter2".to_string().into()),
            database: "markets".to_string(),
            connect_timeout_secs: 5,
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("markets"));
    }

    #[test]
    fn test_connect_timeout() {
        assert_eq!(config().connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_connect_options() {
        let options = config().connect_options();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_username(), "indices");
        assert_eq!(options.get_database(), Some("markets"));
    }
}
