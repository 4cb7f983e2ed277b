//! 音频处理模块
//!
//! 驱动单条音轨的分析：打开解码协作方、逐块喂给分析器、在单文件模式下写出协议流。

use super::cli::AppConfig;
use super::formatter;
use crate::audio::{FrameSource, SymphoniaSource, TrackTags};
use crate::error::AudioResult;
use crate::processing::{AnalysisReport, AnalyzerConfig, TrackAnalyzer};
use std::io::Write;
use std::path::Path;

/// 分析任意帧源直到流结束
///
/// 任一环节出错立即返回，已累积的统计随分析器一起丢弃。
pub fn analyze_source<S: FrameSource + ?Sized>(
    source: &mut S,
    config: AnalyzerConfig,
) -> AudioResult<AnalysisReport> {
    let mut analyzer = TrackAnalyzer::new(source.metadata().clone(), config)?;

    while let Some(block) = source.next_block()? {
        analyzer.process_block(&block)?;
    }

    log::debug!("解码完成 / decoded {} frames", analyzer.frames());
    analyzer.finish()
}

/// 分析单个音频文件，同时返回容器中的标签
pub fn analyze_file(path: &Path, config: AnalyzerConfig) -> AudioResult<(AnalysisReport, TrackTags)> {
    let mut source = SymphoniaSource::open(path)?;
    let tags = source.tags();
    let report = analyze_source(&mut source, config)?;
    Ok((report, tags))
}

/// 单文件模式：分析并写出协议流
///
/// 先在内存中完成编码再一次性写出，出错时不会产生任何部分输出。
pub fn run_single(config: &AppConfig) -> AudioResult<AnalysisReport> {
    log::info!("分析文件 / analysing {}", config.input_path.display());

    let (report, _tags) = analyze_file(&config.input_path, config.analyzer_config())?;
    let encoded = formatter::encode_waveplot_output(&report);

    match &config.output_path {
        Some(path) => std::fs::write(path, &encoded)?,
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(&encoded)?;
            handle.flush()?;
        }
    }

    Ok(report)
}
