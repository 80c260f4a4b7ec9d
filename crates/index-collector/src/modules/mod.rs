//! 지수 수집 단계별 모듈.

pub mod date_fill;
pub mod ohlcv_collect;
pub mod table_init;
pub mod workflow;

pub use date_fill::{fill_missing_dates, ReconcileOutcome};
pub use ohlcv_collect::{fetch_and_store, FetchOutcome};
pub use table_init::{initialize_table, probe_table, ProbeOutcome};
pub use workflow::{collect_indices, run, WorkflowReport};
