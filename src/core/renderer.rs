//! 波形渲染：平滑、归一化到0-200字节、静音裁切检测

use super::waveform::WaveformChunkSeries;
use crate::tools::constants::waveform::{CHUNKS_PER_SECOND, SCALE, SMOOTHING_WEIGHTS, TRIM_THRESHOLD};

/// 非静音区间（字节下标，闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimRange {
    pub start: usize,
    pub end: usize,
}

impl TrimRange {
    /// 裁切后的时长（秒，整数截断）
    pub fn duration_secs(&self) -> u32 {
        ((self.end - self.start) as u32) / CHUNKS_PER_SECOND
    }
}

/// 渲染结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedWaveform {
    /// 每块一个字节，0-200
    pub bytes: Vec<u8>,
    /// 全部不超过阈值（含空序列）时为 `None`
    pub trim: Option<TrimRange>,
    /// 平滑后最大值为0
    pub silent: bool,
}

impl RenderedWaveform {
    pub fn trimmed_secs(&self) -> u32 {
        self.trim.map(|t| t.duration_secs()).unwrap_or(0)
    }
}

/// 对称加权平滑，边界处没有回绕
pub fn smooth(chunks: &[f64]) -> Vec<f64> {
    let len = chunks.len();
    let mut smoothed = vec![0.0; len];
    for (c, &value) in chunks.iter().enumerate() {
        smoothed[c] += value * SMOOTHING_WEIGHTS[0];
        for (offset, &weight) in SMOOTHING_WEIGHTS.iter().enumerate().skip(1) {
            if let Some(right) = c.checked_add(offset).filter(|&i| i < len) {
                smoothed[right] += value * weight;
            }
            if let Some(left) = c.checked_sub(offset) {
                smoothed[left] += value * weight;
            }
        }
    }
    smoothed
}

/// 在字节刻度上查找首尾超过阈值的位置
pub fn detect_trim(bytes: &[u8]) -> Option<TrimRange> {
    let start = bytes.iter().position(|&b| b > TRIM_THRESHOLD)?;
    let end = bytes.iter().rposition(|&b| b > TRIM_THRESHOLD)?;
    Some(TrimRange { start, end })
}

/// 渲染块序列
///
/// 静音（最大值为0）时输出等长的全零字节，且不给出裁切区间。
/// 整数PCM的数字静音归一化后是一个很小的直流电平，不会进入此分支。
pub fn render(series: &WaveformChunkSeries) -> RenderedWaveform {
    let smoothed = smooth(series.as_slice());
    let max = smoothed.iter().copied().fold(0.0f64, f64::max);

    if max <= 0.0 {
        if !smoothed.is_empty() {
            log::warn!("波形全部静音 / waveform is silent");
        }
        return RenderedWaveform {
            bytes: vec![0; smoothed.len()],
            trim: None,
            silent: true,
        };
    }

    let bytes: Vec<u8> = smoothed
        .iter()
        .map(|&v| (v / max * SCALE) as u8)
        .collect();
    let trim = detect_trim(&bytes);

    RenderedWaveform {
        bytes,
        trim,
        silent: false,
    }
}
