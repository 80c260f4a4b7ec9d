//! Market index collector CLI.

use clap::{Parser, Subcommand};
use index_collector::logging::{init_logging, LogConfig};
use index_collector::modules::{self, ReconcileOutcome};
use index_collector::CollectorConfig;
use index_data::{Database, PgIndexStore, YahooIndexProvider};

#[derive(Parser)]
#[command(name = "index-collector")]
#[command(about = "Daily market index collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 전체 워크플로우 1회 실행 (기본값)
    Run,

    /// 누락 날짜 보정만 실행
    FillDates,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(&LogConfig::from_env())?;

    tracing::info!("Index Collector 시작");

    // 설정 로드 (.env 포함, 실패 시 즉시 종료)
    let config = CollectorConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "설정 로드 실패");
        e
    })?;
    tracing::debug!(
        host = %config.database.host,
        database = %config.database.database,
        indices = config.registry.len(),
        "설정 로드 완료"
    );

    let db = Database::new(&config.database);
    if let Err(e) = db.health_check().await {
        // 연결 실패는 지수별 단계에서 다시 기록됨
        tracing::warn!(error = %e, "데이터베이스 연결 확인 실패");
    }
    let store = PgIndexStore::new(db);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let provider = YahooIndexProvider::new()?;
            let report = modules::run(&store, &provider, &config).await;
            if report.collection.errors > 0 {
                tracing::warn!(errors = report.collection.errors, "일부 지수 수집 실패");
            }
        }
        Commands::FillDates => {
            if let ReconcileOutcome::Reconciled(stats) =
                modules::fill_missing_dates(&store, &config.registry).await
            {
                stats.log_summary("날짜 보정");
            }
        }
    }

    tracing::info!("Index Collector 종료");

    Ok(())
}
