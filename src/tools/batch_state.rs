//! 批量扫描计数
//!
//! 串行模式用普通字段，并行模式用原子计数 + 互斥表；两者都按 [`FileOutcome`]
//! 归类，并产出同一种快照供汇总表使用。

use super::scanner::{FileOutcome, SkipReason};
use super::utils;
use crate::error::ErrorCategory;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 一次批量扫描的最终计数
#[derive(Debug, Clone, Default)]
pub struct BatchStatsSnapshot {
    pub processed: usize,
    /// 跳过总数（= `already_scanned` + 标签不全）
    pub skipped: usize,
    /// 台账命中的跳过数
    pub already_scanned: usize,
    pub failed: usize,
    /// 失败文件名，按错误类别分组
    pub error_stats: HashMap<ErrorCategory, Vec<String>>,
}

impl BatchStatsSnapshot {
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }

    /// 按类别排序，汇总表据此稳定输出
    pub fn sorted_errors(&self) -> Vec<(ErrorCategory, &[String])> {
        let mut errors: Vec<_> = self
            .error_stats
            .iter()
            .map(|(category, files)| (*category, files.as_slice()))
            .collect();
        errors.sort_by_key(|(category, _)| *category);
        errors
    }
}

/// 单线程计数
#[derive(Debug, Default)]
pub struct SerialBatchStats {
    snapshot: BatchStatsSnapshot,
}

impl SerialBatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个文件的结果，返回该类结果的累计数
    pub fn record(&mut self, path: &Path, outcome: &FileOutcome) -> usize {
        let s = &mut self.snapshot;
        match outcome {
            FileOutcome::Record(_) => {
                s.processed += 1;
                s.processed
            }
            FileOutcome::Skipped(reason) => {
                if *reason == SkipReason::AlreadyScanned {
                    s.already_scanned += 1;
                }
                s.skipped += 1;
                s.skipped
            }
            FileOutcome::Failed(e) => {
                s.error_stats
                    .entry(ErrorCategory::from_audio_error(e))
                    .or_default()
                    .push(utils::extract_filename_lossy(path));
                s.failed += 1;
                s.failed
            }
        }
    }

    pub fn snapshot(&self) -> BatchStatsSnapshot {
        self.snapshot.clone()
    }
}

/// 多线程计数（rayon工作线程共享同一个实例的引用）
#[derive(Debug, Default)]
pub struct ParallelBatchStats {
    processed: AtomicUsize,
    skipped: AtomicUsize,
    already_scanned: AtomicUsize,
    failed: AtomicUsize,
    error_stats: Mutex<HashMap<ErrorCategory, Vec<String>>>,
}

impl ParallelBatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个文件的结果，返回该类结果的累计数
    pub fn record(&self, path: &Path, outcome: &FileOutcome) -> usize {
        match outcome {
            FileOutcome::Record(_) => self.processed.fetch_add(1, Ordering::Relaxed) + 1,
            FileOutcome::Skipped(reason) => {
                if *reason == SkipReason::AlreadyScanned {
                    self.already_scanned.fetch_add(1, Ordering::Relaxed);
                }
                self.skipped.fetch_add(1, Ordering::Relaxed) + 1
            }
            FileOutcome::Failed(e) => {
                // 锁中毒时只丢失文件名，计数照常
                if let Ok(mut stats) = self.error_stats.lock() {
                    stats
                        .entry(ErrorCategory::from_audio_error(e))
                        .or_default()
                        .push(utils::extract_filename_lossy(path));
                }
                self.failed.fetch_add(1, Ordering::Relaxed) + 1
            }
        }
    }

    pub fn snapshot(&self) -> BatchStatsSnapshot {
        BatchStatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            already_scanned: self.already_scanned.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            error_stats: self
                .error_stats
                .lock()
                .map(|stats| stats.clone())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AudioError;

    fn failed(error: AudioError) -> FileOutcome {
        FileOutcome::Failed(error)
    }

    #[test]
    fn test_serial_outcomes_are_classified() {
        let mut stats = SerialBatchStats::new();
        assert_eq!(stats.snapshot().total(), 0);

        let skip_ledger = FileOutcome::Skipped(SkipReason::AlreadyScanned);
        let skip_tags = FileOutcome::Skipped(SkipReason::MissingTags);
        assert_eq!(stats.record(Path::new("a/one.flac"), &skip_ledger), 1);
        assert_eq!(stats.record(Path::new("a/two.flac"), &skip_tags), 2);
        assert_eq!(
            stats.record(
                Path::new("a/bad.wav"),
                &failed(AudioError::BadSampleFormat("u8".into()))
            ),
            1
        );
        assert_eq!(
            stats.record(Path::new("b/bad.wav"), &failed(AudioError::NoSamples)),
            2
        );

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.processed, 0);
        assert_eq!(snapshot.skipped, 2);
        assert_eq!(snapshot.already_scanned, 1);
        assert_eq!(snapshot.failed, 2);
        assert_eq!(snapshot.total(), 4);
        let format_files = &snapshot.error_stats[&ErrorCategory::Format];
        assert_eq!(format_files, &vec!["bad.wav".to_string()]);
    }

    #[test]
    fn test_sorted_errors_are_stable() {
        let mut stats = SerialBatchStats::new();
        stats.record(Path::new("b.mp3"), &failed(AudioError::InvalidInput("x".into())));
        stats.record(Path::new("a.mp3"), &failed(AudioError::NoAudioStream));

        let snapshot = stats.snapshot();
        let categories: Vec<ErrorCategory> =
            snapshot.sorted_errors().iter().map(|(c, _)| *c).collect();
        assert_eq!(categories, vec![ErrorCategory::Stream, ErrorCategory::Other]);
    }

    #[test]
    fn test_parallel_counts_under_contention() {
        use rayon::prelude::*;

        let stats = ParallelBatchStats::new();
        (0..60).into_par_iter().for_each(|i| {
            let outcome = match i % 3 {
                0 => FileOutcome::Skipped(SkipReason::AlreadyScanned),
                1 => FileOutcome::Skipped(SkipReason::MissingTags),
                _ => failed(AudioError::NoSamples),
            };
            stats.record(Path::new(&format!("f{i}.wav")), &outcome);
        });

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.skipped, 40);
        assert_eq!(snapshot.already_scanned, 20);
        assert_eq!(snapshot.failed, 20);
        assert_eq!(snapshot.error_stats.values().map(Vec::len).sum::<usize>(), 20);
    }
}
