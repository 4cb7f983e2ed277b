//! 统一错误处理框架
//!
//! 所有错误均为致命错误：检测到即上报并终止当前音轨的处理，不做重试。
//! 每个错误都有一个可区分的数字退出码，供调用方（扫描器/脚本）识别。

use std::io;
use thiserror::Error;

/// 错误退出码定义
pub mod exit_codes {
    /// 未分类错误
    pub const UNKNOWN: i32 = 1;
    /// 未找到音频流
    pub const NO_AUDIO_STREAM: i32 = 2;
    /// 样本格式缺失/无法识别/不支持
    pub const BAD_SAMPLE_FORMAT: i32 = 3;
    /// 流结束时未解码到任何帧
    pub const NO_SAMPLES: i32 = 4;
    /// 无法打开输入
    pub const OPEN_INPUT: i32 = 5;
    /// 无法读取流信息
    pub const STREAM_INFO: i32 = 6;
    /// 无法打开解码器
    pub const CODEC_OPEN: i32 = 7;
    /// 时长超过上限
    pub const AUDIO_TOO_LONG: i32 = 8;
}

/// 音频处理相关的统一错误类型
#[derive(Debug, Error)]
pub enum AudioError {
    /// 解码协作方未找到音频轨道
    #[error("未找到音频流 / No audio stream found")]
    NoAudioStream,

    /// 格式缺失、无法识别，或属于不支持的无符号8位格式
    #[error("样本格式错误 / Bad sample format: {0}")]
    BadSampleFormat(String),

    /// 流结束时一帧都没有解码到
    #[error("未解码到任何样本 / No samples decoded")]
    NoSamples,

    /// 时长超过配置的上限
    #[error("音频过长 / Audio too long: {duration_secs}s > {limit_secs}s")]
    AudioTooLong { duration_secs: u64, limit_secs: u32 },

    /// 打开输入失败（文件不可读或容器无法识别）
    #[error("无法打开输入 / Failed to open input: {0}")]
    OpenInput(String),

    /// 流信息不完整（采样率/声道数缺失）
    #[error("无法读取流信息 / Failed to read stream info: {0}")]
    StreamInfo(String),

    /// 创建解码器失败
    #[error("无法打开解码器 / Failed to open codec: {0}")]
    CodecOpen(String),

    /// 解码过程中的不可恢复错误
    #[error("音频解码失败 / Decoding failed: {0}")]
    DecodingError(String),

    /// 输入验证失败
    #[error("输入验证失败 / Invalid input: {0}")]
    InvalidInput(String),

    /// 文件I/O错误
    #[error("文件I/O错误 / I/O error: {0}")]
    IoError(#[from] io::Error),

    /// 扫描记录/台账序列化错误
    #[error("序列化失败 / Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AudioError {
    /// 获取该错误对应的进程退出码
    pub fn exit_code(&self) -> i32 {
        match self {
            AudioError::NoAudioStream => exit_codes::NO_AUDIO_STREAM,
            AudioError::BadSampleFormat(_) => exit_codes::BAD_SAMPLE_FORMAT,
            AudioError::NoSamples => exit_codes::NO_SAMPLES,
            AudioError::OpenInput(_) => exit_codes::OPEN_INPUT,
            AudioError::StreamInfo(_) => exit_codes::STREAM_INFO,
            AudioError::CodecOpen(_) => exit_codes::CODEC_OPEN,
            AudioError::AudioTooLong { .. } => exit_codes::AUDIO_TOO_LONG,
            AudioError::DecodingError(_)
            | AudioError::InvalidInput(_)
            | AudioError::IoError(_)
            | AudioError::Serialization(_) => exit_codes::UNKNOWN,
        }
    }
}

/// 音频处理操作的标准Result类型
pub type AudioResult<T> = Result<T, AudioError>;

// ==================== 错误转换Helper函数 ====================

/// 创建样本格式错误的helper函数
#[inline]
pub fn bad_sample_format<E: std::fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::BadSampleFormat(format!("{context}: {err}"))
}

/// 创建解码错误的helper函数
#[inline]
pub fn decoding_error<E: std::fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::DecodingError(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================
// 用于批量处理中的错误统计

/// 错误类别枚举（用于批量处理统计）
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// 容器/流相关（无音频流、无法打开、流信息缺失）
    Stream,
    /// 样本格式相关
    Format,
    /// 解码相关（解码器失败、无样本）
    Decoding,
    /// 时长超限
    TooLong,
    /// I/O相关
    Io,
    /// 其他未分类错误
    Other,
}

impl ErrorCategory {
    /// 从AudioError提取错误类别
    pub fn from_audio_error(e: &AudioError) -> Self {
        match e {
            AudioError::NoAudioStream
            | AudioError::OpenInput(_)
            | AudioError::StreamInfo(_) => Self::Stream,
            AudioError::BadSampleFormat(_) => Self::Format,
            AudioError::CodecOpen(_) | AudioError::DecodingError(_) | AudioError::NoSamples => {
                Self::Decoding
            }
            AudioError::AudioTooLong { .. } => Self::TooLong,
            AudioError::IoError(_) => Self::Io,
            AudioError::InvalidInput(_) | AudioError::Serialization(_) => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Stream => "流错误 / Stream",
            Self::Format => "格式错误 / Format",
            Self::Decoding => "解码错误 / Decoding",
            Self::TooLong => "时长超限 / Too long",
            Self::Io => "I/O错误 / I/O",
            Self::Other => "其他错误 / Other",
        }
    }
}
