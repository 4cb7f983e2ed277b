//! 工具模块集合
//!
//! 包含CLI、输出协议、单文件/批量处理等工具模块，支持main.rs的流程控制。

pub mod batch_state;
pub mod cli;
pub mod constants;
pub mod formatter;
pub mod ledger;
pub mod parallel_processor;
pub mod processor;
pub mod scanner;
pub mod utils;

// 重新导出主要的公共接口
pub use batch_state::BatchStatsSnapshot;
pub use cli::{AppConfig, parse_args, parse_args_from};
pub use formatter::{
    ParsedOutput, encode_waveplot_output, parse_waveplot_output, write_waveplot_output,
};
pub use ledger::ScanLedger;
pub use processor::{analyze_file, analyze_source, run_single};
pub use scanner::{FileOutcome, SkipReason, SubmissionRecord, run_batch, scan_audio_files};
