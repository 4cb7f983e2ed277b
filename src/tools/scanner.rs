//! 批量扫描模块
//!
//! 递归扫描目录中的音频文件，逐个分析并生成提交记录（JSON行），
//! 借助台账跳过已用当前协议版本扫描过的文件。

use super::batch_state::{BatchStatsSnapshot, SerialBatchStats};
use super::cli::AppConfig;
use super::constants::protocol::PROTOCOL_VERSION;
use super::ledger::ScanLedger;
use super::{parallel_processor, processor, utils};
use crate::audio::{FrameSource, SUPPORTED_EXTENSIONS, SymphoniaSource, TrackTags};
use crate::error::{AudioError, AudioResult};
use crate::processing::AnalysisReport;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 递归扫描目录中的音频文件（按路径排序）
pub fn scan_audio_files(dir_path: &Path) -> AudioResult<Vec<PathBuf>> {
    if !dir_path.exists() {
        return Err(AudioError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("目录不存在: {}", dir_path.display()),
        )));
    }

    if !dir_path.is_dir() {
        return Err(AudioError::InvalidInput(format!(
            "路径不是目录: {}",
            dir_path.display()
        )));
    }

    let mut audio_files: Vec<PathBuf> = WalkDir::new(dir_path)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("跳过无法访问的路径 / skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            utils::extension_lowercase(path)
                .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        })
        .collect();

    audio_files.sort();
    Ok(audio_files)
}

/// 一条提交记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub path: String,
    pub recording: Option<String>,
    pub release: Option<String>,
    pub track: Option<String>,
    pub disc: Option<String>,
    /// 一位小数的DR文本
    pub dr_level: String,
    /// base64编码的波形字节
    pub image: String,
    pub length: u32,
    pub trimmed: u32,
    /// 格式标识 `<codec>-<bit_rate>`
    pub source: String,
    pub num_channels: usize,
    pub version: String,
}

impl SubmissionRecord {
    pub fn new(path: String, report: &AnalysisReport, tags: TrackTags) -> Self {
        Self {
            path,
            recording: tags.recording_id,
            release: tags.release_id,
            track: tags.track_number,
            disc: tags.disc_number,
            dr_level: report.dr_text(),
            image: STANDARD.encode(&report.waveform.bytes),
            length: report.duration_secs,
            trimmed: report.trimmed_secs,
            source: report.format_id(),
            num_channels: report.reported_channels,
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    /// 解码波形字节
    pub fn image_bytes(&self) -> AudioResult<Vec<u8>> {
        STANDARD
            .decode(&self.image)
            .map_err(|e| AudioError::InvalidInput(format!("无效的base64波形: {e}")))
    }
}

/// 跳过原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 台账中已有当前版本的记录
    AlreadyScanned,
    /// 缺少MusicBrainz标签
    MissingTags,
}

/// 单个文件的处理结果
#[derive(Debug)]
pub enum FileOutcome {
    Record(SubmissionRecord),
    Skipped(SkipReason),
    Failed(AudioError),
}

fn analyze_tagged(path: &Path, key: String, config: &AppConfig) -> AudioResult<Option<SubmissionRecord>> {
    let mut source = SymphoniaSource::open(path)?;
    let tags = source.tags();
    if config.require_tags && !tags.is_complete() {
        return Ok(None);
    }
    let report = processor::analyze_source(&mut source, config.analyzer_config())?;
    Ok(Some(SubmissionRecord::new(key, &report, tags)))
}

/// 处理批量模式中的一个文件
pub fn process_file(path: &Path, config: &AppConfig, ledger: &ScanLedger) -> FileOutcome {
    let key = utils::path_key(path);
    if ledger.is_current(&key, PROTOCOL_VERSION) {
        log::debug!("已扫描，跳过 / already scanned: {key}");
        return FileOutcome::Skipped(SkipReason::AlreadyScanned);
    }

    match analyze_tagged(path, key, config) {
        Ok(Some(record)) => {
            log::info!("{} DR{}", utils::extract_filename_lossy(path), record.dr_level);
            FileOutcome::Record(record)
        }
        Ok(None) => {
            log::info!(
                "标签不全，跳过 / missing tags: {}",
                utils::extract_filename_lossy(path)
            );
            FileOutcome::Skipped(SkipReason::MissingTags)
        }
        Err(e) => {
            log::warn!("{} - {e} (exit code {})", path.display(), e.exit_code());
            FileOutcome::Failed(e)
        }
    }
}

/// 串行处理所有文件
pub fn process_files_serial(
    files: &[PathBuf],
    config: &AppConfig,
    ledger: &ScanLedger,
) -> (Vec<FileOutcome>, BatchStatsSnapshot) {
    let mut stats = SerialBatchStats::new();
    let outcomes = files
        .iter()
        .map(|path| {
            let outcome = process_file(path, config, ledger);
            stats.record(path, &outcome);
            outcome
        })
        .collect();
    (outcomes, stats.snapshot())
}

/// 把提交记录写成JSON行
pub fn write_records<'a, W, I>(writer: &mut W, records: I) -> AudioResult<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a SubmissionRecord>,
{
    let mut count = 0;
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// 批量汇总表
pub fn format_batch_summary(snapshot: &BatchStatsSnapshot) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["结果 / Result", "文件数 / Files"]);

    let rows = [
        ("成功 / Analysed", snapshot.processed),
        ("跳过 / Skipped", snapshot.skipped),
        ("  已扫描 / Already scanned", snapshot.already_scanned),
        ("失败 / Failed", snapshot.failed),
    ];
    for (label, count) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    for (category, files) in snapshot.sorted_errors() {
        table.add_row(vec![
            Cell::new(format!("  {}", category.display_name())),
            Cell::new(files.len()).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}

/// 批量模式入口
pub fn run_batch(config: &AppConfig) -> AudioResult<BatchStatsSnapshot> {
    let files = scan_audio_files(&config.input_path)?;
    log::info!(
        "扫描目录 {}：找到 {} 个音频文件 / found {} audio files",
        config.input_path.display(),
        files.len(),
        files.len()
    );

    let mut ledger = ScanLedger::load(&config.effective_ledger_path())?;

    let (outcomes, snapshot) = match config.parallel_files {
        Some(degree) if degree > 1 && files.len() > 1 => {
            // 线程池创建失败时降级为串行
            parallel_processor::process_files_parallel(&files, config, &ledger, degree)
                .unwrap_or_else(|e| {
                    log::warn!("并行处理失败 / parallel processing failed: {e}，回退到串行模式");
                    process_files_serial(&files, config, &ledger)
                })
        }
        _ => process_files_serial(&files, config, &ledger),
    };

    let records: Vec<&SubmissionRecord> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            FileOutcome::Record(record) => Some(record),
            _ => None,
        })
        .collect();

    match &config.output_path {
        Some(path) => {
            let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
            write_records(&mut file, records.iter().copied())?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write_records(&mut handle, records.iter().copied())?;
        }
    }

    if !records.is_empty() {
        let now = chrono::Utc::now();
        for record in &records {
            ledger.record(record.path.clone(), PROTOCOL_VERSION, now);
        }
        ledger.save()?;
    }

    eprintln!("{}", format_batch_summary(&snapshot));
    Ok(snapshot)
}
