//! WavePlot Imager - 主程序入口
//!
//! 纯流程控制器：单文件模式把输出协议写到stdout，目录则进入批量扫描模式。

use env_logger::Env;
use std::process;
use waveplot_imager::{
    audio::SUPPORTED_EXTENSIONS,
    error::{AudioError, ErrorCategory},
    tools::{self, AppConfig},
};

/// 日志级别环境变量
const LOG_ENV: &str = "WAVEPLOT_LOG";

/// 获取错误建议文本
fn get_error_suggestion(error: &AudioError) -> &'static str {
    match error {
        AudioError::InvalidInput(_) => {
            "检查命令行参数是否正确，使用 --help 查看完整用法 / Check command-line arguments, use --help for usage"
        }
        AudioError::AudioTooLong { .. } => {
            "使用 --max-duration 调整上限（0 表示不限制） / Raise the cap with --max-duration (0 disables it)"
        }
        _ => match ErrorCategory::from_audio_error(error) {
            ErrorCategory::Io => {
                "检查文件路径是否正确，文件是否存在且可读 / Check the file exists and is readable"
            }
            ErrorCategory::Stream | ErrorCategory::Format => {
                "确保输入文件为支持的格式 / Ensure the input is a supported format"
            }
            ErrorCategory::Decoding => {
                "文件可能损坏或使用不支持的音频编码 / File may be corrupted or use an unsupported codec"
            }
            ErrorCategory::TooLong | ErrorCategory::Other => {
                "请检查输入文件和参数设置 / Check the input file and parameters"
            }
        },
    }
}

/// 错误处理：诊断写到stderr，以错误码退出
fn handle_error(error: AudioError) -> ! {
    let code = error.exit_code();
    eprintln!("WavePlot Imager encountered an error! Error Code {code}.");
    eprintln!("[ERROR] 错误 / Error: {error}");
    eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(&error));

    if matches!(
        ErrorCategory::from_audio_error(&error),
        ErrorCategory::Stream | ErrorCategory::Format
    ) {
        let formats: Vec<String> = SUPPORTED_EXTENSIONS
            .iter()
            .map(|s| s.to_uppercase())
            .collect();
        eprintln!("   Supported formats / 支持的格式: {}", formats.join(", "));
    }

    process::exit(code);
}

fn init_logging(config: &AppConfig) {
    let default_level = if config.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(Env::default().filter_or(LOG_ENV, default_level))
        .format_timestamp(None)
        .init();
}

/// 应用程序主逻辑
fn run(config: &AppConfig) -> Result<(), AudioError> {
    config.check_protocol_version()?;

    if config.is_batch_mode() {
        let snapshot = tools::run_batch(config)?;
        log::info!(
            "批量处理完成 / batch finished: {} analysed, {} skipped, {} failed",
            snapshot.processed,
            snapshot.skipped,
            snapshot.failed
        );
    } else {
        tools::run_single(config)?;
    }
    Ok(())
}

fn main() {
    let config = tools::parse_args();
    init_logging(&config);

    if let Err(error) = run(&config) {
        handle_error(error);
    }
}
