//! 多文件并行处理模块
//!
//! 使用rayon实现文件级并行处理。单条音轨的分析始终是单线程顺序执行的，
//! 并行只发生在文件之间；结果按原始索引排序，保证输出顺序与串行模式一致。

use super::batch_state::{BatchStatsSnapshot, ParallelBatchStats};
use super::cli::AppConfig;
use super::ledger::ScanLedger;
use super::scanner::{self, FileOutcome};
use super::utils;
use crate::error::{AudioError, AudioResult};
use rayon::prelude::*;
use std::path::PathBuf;

/// 有序结果容器（保证输出顺序）
struct OrderedResult {
    /// 原始文件索引（用于排序）
    index: usize,
    outcome: FileOutcome,
}

/// 多文件并行处理
///
/// 使用自定义rayon线程池精确控制并发度，统计信息线程安全地收集。
pub fn process_files_parallel(
    audio_files: &[PathBuf],
    config: &AppConfig,
    ledger: &ScanLedger,
    parallel_degree: usize,
) -> AudioResult<(Vec<FileOutcome>, BatchStatsSnapshot)> {
    log::info!("启用多文件并行处理：{parallel_degree} 并发度");

    let stats = ParallelBatchStats::new();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel_degree)
        .thread_name(|i| format!("waveplot-worker-{i}"))
        .build()
        .map_err(|e| AudioError::InvalidInput(format!("线程池创建失败: {e}")))?;

    let mut results: Vec<OrderedResult> = pool.install(|| {
        audio_files
            .par_iter()
            .enumerate()
            .map(|(index, audio_file)| {
                let outcome = scanner::process_file(audio_file, config, ledger);
                let count = stats.record(audio_file, &outcome);
                if matches!(outcome, FileOutcome::Record(_)) {
                    log::debug!(
                        "[{}/{}] {}",
                        count,
                        audio_files.len(),
                        utils::extract_filename_lossy(audio_file)
                    );
                }

                OrderedResult { index, outcome }
            })
            .collect()
    });

    // 按原始顺序排序结果
    results.sort_by_key(|r| r.index);

    Ok((
        results.into_iter().map(|r| r.outcome).collect(),
        stats.snapshot(),
    ))
}
