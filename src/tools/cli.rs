//! 命令行接口模块
//!
//! 负责命令行参数解析和配置管理。

use super::constants::{defaults, parallel_limits, protocol};
use crate::error::{AudioError, AudioResult};
use crate::processing::AnalyzerConfig;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 输入文件路径（单文件模式）或扫描目录（批量模式）
    pub input_path: PathBuf,

    /// 扫描器传入的协议版本（握手）
    pub protocol_version: Option<String>,

    /// 最大可分析时长（秒），0表示不限制
    pub max_duration_secs: u32,

    /// 输出文件路径（单文件模式写协议流，批量模式写JSON行）
    pub output_path: Option<PathBuf>,

    /// 批量模式台账路径
    pub ledger_path: Option<PathBuf>,

    /// 批量模式只分析标签齐全的文件
    pub require_tags: bool,

    /// 多文件并行度（`None` 表示串行）
    pub parallel_files: Option<usize>,

    /// 是否显示详细信息
    pub verbose: bool,
}

impl AppConfig {
    /// 智能判断是否为批量模式（基于路径类型）
    #[inline]
    pub fn is_batch_mode(&self) -> bool {
        self.input_path.is_dir()
    }

    /// 核心分析器看到的配置
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            max_duration_secs: (self.max_duration_secs > 0).then_some(self.max_duration_secs),
        }
    }

    /// 握手：给出的版本号必须与本程序的协议版本一致
    pub fn check_protocol_version(&self) -> AudioResult<()> {
        match self.protocol_version.as_deref() {
            Some(version) if version != protocol::PROTOCOL_VERSION => {
                Err(AudioError::InvalidInput(format!(
                    "协议版本不匹配 / protocol version mismatch: got {version}, expected {}",
                    protocol::PROTOCOL_VERSION
                )))
            }
            _ => Ok(()),
        }
    }

    /// 批量模式台账路径（默认位于扫描目录下）
    pub fn effective_ledger_path(&self) -> PathBuf {
        self.ledger_path
            .clone()
            .unwrap_or_else(|| self.input_path.join(defaults::LEDGER_FILE_NAME))
    }
}

fn build_command() -> Command {
    Command::new("waveplot-imager")
        .version(VERSION)
        .about(DESCRIPTION)
        .author("WavePlot Team")
        .arg(
            Arg::new("INPUT")
                .help("音频文件或目录路径 / audio file (single mode) or directory (batch mode)")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("VERSION")
                .help("扫描器握手版本号 / scanner handshake version")
                .required(false)
                .index(2),
        )
        .arg(
            Arg::new("max-duration")
                .long("max-duration")
                .help("最大可分析时长（秒），0表示不限制 / duration cap in seconds, 0 disables")
                .value_name("SECS")
                .value_parser(value_parser!(u32))
                .default_value("3000"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("输出结果到文件 / write output to a file instead of stdout")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("ledger")
                .long("ledger")
                .help("批量模式台账文件 / batch ledger file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("require-tags")
                .long("require-tags")
                .help("只分析带MusicBrainz标签的文件 / only analyse files with MusicBrainz tags")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("parallel-files")
                .long("parallel-files")
                .short('j')
                .help("多文件并行度 / number of files analysed in parallel")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .default_value("4"),
        )
        .arg(
            Arg::new("serial")
                .long("serial")
                .help("串行处理批量文件 / process batch files one at a time")
                .action(ArgAction::SetTrue)
                .conflicts_with("parallel-files"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息 / verbose logging")
                .action(ArgAction::SetTrue),
        )
}

fn config_from_matches(matches: &ArgMatches) -> AppConfig {
    let parallel_files = if matches.get_flag("serial") {
        None
    } else {
        let requested = matches
            .get_one::<usize>("parallel-files")
            .copied()
            .unwrap_or(defaults::PARALLEL_FILES_DEGREE);
        Some(requested.clamp(
            parallel_limits::MIN_PARALLEL_DEGREE,
            parallel_limits::MAX_PARALLEL_DEGREE,
        ))
    };

    AppConfig {
        input_path: matches
            .get_one::<PathBuf>("INPUT")
            .cloned()
            .unwrap_or_default(),
        protocol_version: matches.get_one::<String>("VERSION").cloned(),
        max_duration_secs: matches
            .get_one::<u32>("max-duration")
            .copied()
            .unwrap_or(defaults::MAX_DURATION_SECS),
        output_path: matches.get_one::<PathBuf>("output").cloned(),
        ledger_path: matches.get_one::<PathBuf>("ledger").cloned(),
        require_tags: matches.get_flag("require-tags"),
        parallel_files,
        verbose: matches.get_flag("verbose"),
    }
}

/// 解析命令行参数并创建配置（参数错误时由clap打印帮助并退出）
pub fn parse_args() -> AppConfig {
    config_from_matches(&build_command().get_matches())
}

/// 从给定参数解析配置
pub fn parse_args_from<I, T>(args: I) -> Result<AppConfig, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;
    Ok(config_from_matches(&matches))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_args_from(["waveplot-imager", "track.flac"]).unwrap();
        assert_eq!(config.input_path, PathBuf::from("track.flac"));
        assert_eq!(config.protocol_version, None);
        assert_eq!(config.max_duration_secs, defaults::MAX_DURATION_SECS);
        assert_eq!(config.parallel_files, Some(defaults::PARALLEL_FILES_DEGREE));
        assert!(!config.require_tags);
        assert_eq!(
            config.analyzer_config(),
            AnalyzerConfig {
                max_duration_secs: Some(3000)
            }
        );
    }

    #[test]
    fn test_version_handshake() {
        let ok = parse_args_from(["waveplot-imager", "a.mp3", "CITRUS"]).unwrap();
        assert!(ok.check_protocol_version().is_ok());

        let bad = parse_args_from(["waveplot-imager", "a.mp3", "BANANA"]).unwrap();
        assert!(matches!(
            bad.check_protocol_version(),
            Err(AudioError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_duration_disables_cap() {
        let config = parse_args_from(["waveplot-imager", "a.wav", "--max-duration", "0"]).unwrap();
        assert_eq!(config.analyzer_config(), AnalyzerConfig::unlimited());
    }

    #[test]
    fn test_parallel_degree_clamped() {
        let high = parse_args_from(["waveplot-imager", "dir", "-j", "64"]).unwrap();
        assert_eq!(high.parallel_files, Some(16));
        let low = parse_args_from(["waveplot-imager", "dir", "-j", "0"]).unwrap();
        assert_eq!(low.parallel_files, Some(1));
        let serial = parse_args_from(["waveplot-imager", "dir", "--serial"]).unwrap();
        assert_eq!(serial.parallel_files, None);
    }

    #[test]
    fn test_missing_input_is_error() {
        assert!(parse_args_from(["waveplot-imager"]).is_err());
    }

    #[test]
    fn test_default_ledger_path() {
        let config = parse_args_from(["waveplot-imager", "/music"]).unwrap();
        assert_eq!(
            config.effective_ledger_path(),
            PathBuf::from("/music/.waveplot_ledger.json")
        );
    }
}
