//! 音轨元数据模块
//!
//! 定义在流打开时一次性捕获、之后不可变的音轨信息

use crate::error::{AudioError, AudioResult};
use serde::{Deserialize, Serialize};

/// 音轨元数据
///
/// 由解码协作方在打开流时构造。`channels` 是物理解码的声道数，
/// 伪立体声重分类只影响报告值，不修改这里。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub channels: u16,
    pub sample_rate: u32,
    /// 比特率（bit/s）
    pub bit_rate: u32,
    /// 编解码器标识（如 `flac`、`pcm_s16le`、`mp3`）
    pub codec_id: String,
    /// 近似时长（整秒，截断）
    pub duration_secs: u32,
}

impl TrackMetadata {
    pub fn new(
        channels: u16,
        sample_rate: u32,
        bit_rate: u32,
        codec_id: impl Into<String>,
        duration_secs: u32,
    ) -> Self {
        Self {
            channels,
            sample_rate,
            bit_rate,
            codec_id: codec_id.into(),
            duration_secs,
        }
    }

    /// 验证格式参数的有效性
    pub fn validate(&self) -> AudioResult<()> {
        if self.channels == 0 {
            return Err(AudioError::StreamInfo("声道数不能为0".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(AudioError::StreamInfo("采样率不能为0".to_string()));
        }
        Ok(())
    }

    /// 输出协议中的格式标识：`<codec>-<bit_rate>`
    pub fn format_id(&self) -> String {
        format!("{}-{}", self.codec_id, self.bit_rate)
    }

    /// 获取声道数（usize类型）
    ///
    /// 辅助方法，用于数组索引和循环边界
    pub fn channels_usize(&self) -> usize {
        self.channels as usize
    }
}

/// 从标签中读取的 MusicBrainz 标识（批量扫描使用）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    pub recording_id: Option<String>,
    pub release_id: Option<String>,
    pub track_number: Option<String>,
    pub disc_number: Option<String>,
}

impl TrackTags {
    /// 四个标识是否齐全
    pub fn is_complete(&self) -> bool {
        self.recording_id.is_some()
            && self.release_id.is_some()
            && self.track_number.is_some()
            && self.disc_number.is_some()
    }

    /// 规范化 `n/m` 形式的序号，只保留 `n`
    pub fn normalize_index(raw: &str) -> Option<String> {
        let head = raw.split('/').next().unwrap_or("").trim();
        if head.is_empty() {
            None
        } else {
            Some(head.to_string())
        }
    }
}
