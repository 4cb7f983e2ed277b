//! 伪立体声检测
//!
//! 累积每帧 `|0.5 * L - 0.5 * R|`，流结束后按帧数求均值。
//! 双声道且均值低于阈值时，音轨被报告为单声道。

use crate::tools::constants::channel_balance::FALSE_STEREO_THRESHOLD;

/// 声道差累积器
#[derive(Debug, Clone)]
pub struct ChannelBalanceTracker {
    channels: usize,
    delta_sum: f64,
    frames: u64,
}

impl ChannelBalanceTracker {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            delta_sum: 0.0,
            frames: 0,
        }
    }

    /// 消费一个归一化帧（全部声道）
    ///
    /// 只有恰好两个声道时才累积声道差，帧数总是计数。
    #[inline]
    pub fn process_frame(&mut self, frame: &[f64]) {
        if self.channels == 2 && frame.len() == 2 {
            let delta = 0.5 * frame[0] - 0.5 * frame[1];
            self.delta_sum += delta.abs();
        }
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 每帧平均声道差；非双声道或没有帧时为 `None`
    pub fn mean_delta(&self) -> Option<f64> {
        if self.channels != 2 || self.frames == 0 {
            return None;
        }
        Some(self.delta_sum / self.frames as f64)
    }

    pub fn is_false_stereo(&self) -> bool {
        self.mean_delta()
            .is_some_and(|mean| mean < FALSE_STEREO_THRESHOLD)
    }

    /// 对外报告的声道数（伪立体声折叠为1）
    pub fn reported_channels(&self) -> usize {
        if self.is_false_stereo() {
            1
        } else {
            self.channels
        }
    }
}
