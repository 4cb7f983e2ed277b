//! DR计算核心引擎
//!
//! 每个声道按3秒窗口累积峰值与平方和，流结束后：
//!
//! 1. 窗口RMS：`sqrt(2 * Σ(smp²) / n)`
//! 2. 取最响的 ⌈窗口数/5⌉ 个窗口（至少1个）计算二阶RMS：`sqrt(Σ(rms²) / N)`
//! 3. 参考峰值：窗口数≥3时取第二大窗口峰值，否则取最大峰值
//! 4. 声道DR：`20 * log10(参考峰值 / 二阶RMS)`
//!
//! 最终评级为各声道DR的算术平均。评级只在流结束后产生，不存在部分结果。

use crate::tools::constants::dr_analysis::{
    MIN_WINDOWS_FOR_SECOND_PEAK, TOP_WINDOW_DIVISOR, WINDOW_DURATION_SECONDS,
};

/// 已完成的统计窗口
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// 窗口内最大绝对样本值
    pub peak: f64,
    /// 窗口RMS（含系数2）
    pub rms: f64,
    /// 窗口内样本数
    pub samples: u64,
}

/// 单声道窗口统计
///
/// 当前窗口在下一个样本到来且计数已满时才完成，
/// 因此流结束时总有一个（可能不满的）窗口处于打开状态。
#[derive(Debug, Clone)]
pub struct ChannelWindowStats {
    window_size: u64,
    finalized: Vec<WindowStats>,
    peak: f64,
    sum_squares: f64,
    samples: u64,
}

impl ChannelWindowStats {
    pub fn new(window_size: u64) -> Self {
        Self {
            window_size: window_size.max(1),
            finalized: Vec::new(),
            peak: 0.0,
            sum_squares: 0.0,
            samples: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, sample: f64) {
        if self.samples >= self.window_size {
            self.close_open_window();
        }
        let magnitude = sample.abs();
        if magnitude > self.peak {
            self.peak = magnitude;
        }
        self.sum_squares += sample * sample;
        self.samples += 1;
    }

    /// 已完成的窗口（不含当前打开的窗口）
    pub fn finalized_windows(&self) -> &[WindowStats] {
        &self.finalized
    }

    /// 当前打开窗口的样本计数
    pub fn open_samples(&self) -> u64 {
        self.samples
    }

    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    /// 以实际样本数为除数完成当前窗口
    fn close_open_window(&mut self) {
        if self.samples == 0 {
            return;
        }
        let rms = (2.0 * self.sum_squares / self.samples as f64).sqrt();
        self.finalized.push(WindowStats {
            peak: self.peak,
            rms,
            samples: self.samples,
        });
        self.peak = 0.0;
        self.sum_squares = 0.0;
        self.samples = 0;
    }

    /// 完成最后一个窗口并计算该声道的DR贡献
    pub fn finish(mut self, channel: usize) -> ChannelDr {
        self.close_open_window();
        let windows = self.finalized;

        let top_rms = top_windows_rms(&windows);
        let (peak, second_peak) = highest_two_peaks(&windows);
        let reference_peak = if windows.len() >= MIN_WINDOWS_FOR_SECOND_PEAK {
            second_peak
        } else {
            peak
        };

        // 静音声道贡献0dB
        let dr_value = if top_rms > 0.0 && reference_peak > 0.0 {
            20.0 * (reference_peak / top_rms).log10()
        } else {
            0.0
        };

        ChannelDr {
            channel,
            dr_value,
            top_rms,
            peak,
            second_peak,
            reference_peak,
            window_count: windows.len(),
        }
    }
}

/// 最响的 ⌈n/5⌉ 个窗口的二阶RMS
fn top_windows_rms(windows: &[WindowStats]) -> f64 {
    if windows.is_empty() {
        return 0.0;
    }
    let mut rms: Vec<f64> = windows.iter().map(|w| w.rms).collect();
    rms.sort_by(|a, b| b.total_cmp(a));

    let take = windows.len().div_ceil(TOP_WINDOW_DIVISOR).max(1);
    let sum: f64 = rms.iter().take(take).map(|v| v * v).sum();
    (sum / take as f64).sqrt()
}

/// 窗口峰值中的最大值与第二大值（比较的是数值，不是位置）
fn highest_two_peaks(windows: &[WindowStats]) -> (f64, f64) {
    let mut max = 0.0f64;
    let mut second = 0.0f64;
    for window in windows {
        if window.peak >= max {
            second = max;
            max = window.peak;
        } else if window.peak > second {
            second = window.peak;
        }
    }
    (max, second)
}

/// 单声道DR结果
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDr {
    pub channel: usize,
    /// 该声道的DR贡献（dB）
    pub dr_value: f64,
    /// 二阶RMS
    pub top_rms: f64,
    /// 最大窗口峰值
    pub peak: f64,
    /// 第二大窗口峰值
    pub second_peak: f64,
    /// 实际用于计算的峰值
    pub reference_peak: f64,
    pub window_count: usize,
}

/// 整条音轨的DR结果
#[derive(Debug, Clone, PartialEq)]
pub struct DrResult {
    pub channels: Vec<ChannelDr>,
    /// 各声道DR的算术平均
    pub rating: f64,
}

impl DrResult {
    fn from_channels(channels: Vec<ChannelDr>) -> Self {
        let rating = if channels.is_empty() {
            0.0
        } else {
            channels.iter().map(|c| c.dr_value).sum::<f64>() / channels.len() as f64
        };
        Self { channels, rating }
    }

    /// 输出协议使用的一位小数文本
    pub fn formatted(&self) -> String {
        format!("{:.1}", self.rating)
    }
}

/// 多声道DR估计器
#[derive(Debug, Clone)]
pub struct DynamicRangeEstimator {
    channels: Vec<ChannelWindowStats>,
}

impl DynamicRangeEstimator {
    /// 窗口大小固定为 `sample_rate * 3`，创建后不再改变
    pub fn new(channel_count: usize, sample_rate: u32) -> Self {
        let window_size = sample_rate as u64 * WINDOW_DURATION_SECONDS as u64;
        Self {
            channels: (0..channel_count)
                .map(|_| ChannelWindowStats::new(window_size))
                .collect(),
        }
    }

    /// 逐帧更新，帧内每个声道一个样本
    #[inline]
    pub fn process_frame(&mut self, frame: &[f64]) {
        for (stats, &sample) in self.channels.iter_mut().zip(frame) {
            stats.push(sample);
        }
    }

    pub fn channel_stats(&self) -> &[ChannelWindowStats] {
        &self.channels
    }

    /// 流结束：完成所有声道并给出评级
    pub fn finish(self) -> DrResult {
        let channels: Vec<ChannelDr> = self
            .channels
            .into_iter()
            .enumerate()
            .map(|(index, stats)| stats.finish(index))
            .collect();

        for channel in &channels {
            log::debug!(
                "声道{} DR={:.5} (peak={:.6}, ref={:.6}, rms={:.6}, windows={})",
                channel.channel,
                channel.dr_value,
                channel.peak,
                channel.reference_peak,
                channel.top_rms,
                channel.window_count
            );
        }

        DrResult::from_channels(channels)
    }
}
