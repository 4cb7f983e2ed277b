//! 单音轨分析协调器
//!
//! 每条音轨创建一个 [`TrackAnalyzer`]：流打开时构造，逐块喂入解码单元，
//! 流结束时 `finish` 消费自身并产出 [`AnalysisReport`]。所有累积状态都是
//! 实例字段，一次分析结束后即丢弃。
//!
//! 严格按到达顺序处理：每一帧先归一化，再依次交给伪立体声检测、
//! DR估计和波形聚合，然后才处理下一帧。

use super::sample_conversion::{SampleBlock, SampleFormat};
use crate::audio::TrackMetadata;
use crate::core::renderer::{self, RenderedWaveform};
use crate::core::{ChannelBalanceTracker, DrResult, DynamicRangeEstimator, WaveformAggregator};
use crate::error::{AudioError, AudioResult};
use crate::tools::constants::defaults;

/// 分析配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// 最大可分析时长（秒）；`None` 表示不限制
    pub max_duration_secs: Option<u32>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: Some(defaults::MAX_DURATION_SECS),
        }
    }
}

impl AnalyzerConfig {
    pub fn unlimited() -> Self {
        Self {
            max_duration_secs: None,
        }
    }

    /// 检查时长是否超过上限
    pub fn check_duration(&self, duration_secs: u64) -> AudioResult<()> {
        match self.max_duration_secs {
            Some(limit) if duration_secs > limit as u64 => Err(AudioError::AudioTooLong {
                duration_secs,
                limit_secs: limit,
            }),
            _ => Ok(()),
        }
    }
}

/// 单音轨分析结果
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub metadata: TrackMetadata,
    pub waveform: RenderedWaveform,
    pub dr: DrResult,
    /// 对外报告的声道数（伪立体声折叠为1）
    pub reported_channels: usize,
    pub false_stereo: bool,
    /// 每帧平均声道差（仅双声道）
    pub channel_delta: Option<f64>,
    /// 实际解码帧数
    pub frames: u64,
    /// 时长（秒）：容器给出的时长，未知时按解码帧数推算
    pub duration_secs: u32,
    /// 裁切静音后的时长（秒）
    pub trimmed_secs: u32,
}

impl AnalysisReport {
    pub fn format_id(&self) -> String {
        self.metadata.format_id()
    }

    /// 一位小数的DR文本
    pub fn dr_text(&self) -> String {
        self.dr.formatted()
    }
}

/// 单音轨分析器
#[derive(Debug)]
pub struct TrackAnalyzer {
    metadata: TrackMetadata,
    config: AnalyzerConfig,
    block_format: Option<SampleFormat>,
    frames: u64,
    balance: ChannelBalanceTracker,
    dr: DynamicRangeEstimator,
    waveform: WaveformAggregator,
}

impl TrackAnalyzer {
    /// 流打开时创建
    ///
    /// 元数据无效或容器时长已超过上限时立即失败，不做任何解码。
    pub fn new(metadata: TrackMetadata, config: AnalyzerConfig) -> AudioResult<Self> {
        metadata.validate()?;
        config.check_duration(metadata.duration_secs as u64)?;

        let channels = metadata.channels_usize();
        let sample_rate = metadata.sample_rate;

        Ok(Self {
            balance: ChannelBalanceTracker::new(channels),
            dr: DynamicRangeEstimator::new(channels, sample_rate),
            waveform: WaveformAggregator::new(sample_rate),
            block_format: None,
            frames: 0,
            metadata,
            config,
        })
    }

    pub fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    /// 已处理的帧数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 处理一个解码单元
    ///
    /// 声道数或样本格式与首个单元不一致时报告 `BadSampleFormat`。
    pub fn process_block(&mut self, block: &SampleBlock) -> AudioResult<()> {
        let format = block.format();
        if block.channels() != self.metadata.channels_usize() {
            return Err(AudioError::BadSampleFormat(format!(
                "帧格式不一致 / frame format inconsistency: {} channels, expected {}",
                block.channels(),
                self.metadata.channels
            )));
        }
        match self.block_format {
            None => self.block_format = Some(format),
            Some(expected) if expected != format => {
                return Err(AudioError::BadSampleFormat(format!(
                    "帧格式不一致 / frame format inconsistency: {format:?}, expected {expected:?}"
                )));
            }
            Some(_) => {}
        }

        let total = self.frames + block.frames() as u64;
        // 与打开时相同：按整秒（截断）比较
        self.config
            .check_duration(total / self.metadata.sample_rate as u64)?;

        let balance = &mut self.balance;
        let dr = &mut self.dr;
        let waveform = &mut self.waveform;
        block.for_each_frame(|frame| {
            balance.process_frame(frame);
            dr.process_frame(frame);
            waveform.process_frame(frame);
            Ok(())
        })?;

        self.frames = total;
        Ok(())
    }

    /// 流结束：完成DR、渲染波形、判定伪立体声
    pub fn finish(self) -> AudioResult<AnalysisReport> {
        if self.frames == 0 {
            return Err(AudioError::NoSamples);
        }

        let dr = self.dr.finish();
        let series = self.waveform.finish();
        let waveform = renderer::render(&series);

        let false_stereo = self.balance.is_false_stereo();
        let channel_delta = self.balance.mean_delta();
        let reported_channels = self.balance.reported_channels();

        log::info!("DR Level: {:2.5}", dr.rating);
        if false_stereo {
            log::warn!(
                "Track is false stereo! ({})",
                channel_delta.unwrap_or_default()
            );
        }

        let duration_secs = if self.metadata.duration_secs > 0 {
            self.metadata.duration_secs
        } else {
            u32::try_from(self.frames / self.metadata.sample_rate as u64).unwrap_or(u32::MAX)
        };
        let trimmed_secs = waveform.trimmed_secs();

        Ok(AnalysisReport {
            metadata: self.metadata,
            waveform,
            dr,
            reported_channels,
            false_stereo,
            channel_delta,
            frames: self.frames,
            duration_secs,
            trimmed_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::SampleData;

    fn metadata(channels: u16, sample_rate: u32) -> TrackMetadata {
        TrackMetadata::new(channels, sample_rate, 0, "pcm_s16le", 0)
    }

    fn sine_block(channels: usize, frames: usize, amplitude: f64) -> SampleBlock {
        let mut data = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            let v = (i as f64 * 0.05).sin() * amplitude;
            for ch in 0..channels {
                // 右声道反相，避免被判为伪立体声
                data.push(if ch == 1 { -v } else { v });
            }
        }
        SampleBlock::interleaved(channels, SampleData::F64(data)).unwrap()
    }

    #[test]
    fn test_zero_frames_is_no_samples() {
        let analyzer = TrackAnalyzer::new(metadata(2, 44100), AnalyzerConfig::default()).unwrap();
        assert!(matches!(analyzer.finish(), Err(AudioError::NoSamples)));
    }

    #[test]
    fn test_container_duration_cap_checked_at_open() {
        let meta = TrackMetadata::new(2, 44100, 0, "flac", 4000);
        let result = TrackAnalyzer::new(meta.clone(), AnalyzerConfig::default());
        assert!(matches!(
            result,
            Err(AudioError::AudioTooLong {
                duration_secs: 4000,
                limit_secs: 3000
            })
        ));
        assert!(TrackAnalyzer::new(meta, AnalyzerConfig::unlimited()).is_ok());
    }

    #[test]
    fn test_decoded_frames_cap() {
        let config = AnalyzerConfig {
            max_duration_secs: Some(1),
        };
        let meta = TrackMetadata::new(1, 100, 0, "pcm_s16le", 1);
        let mut analyzer = TrackAnalyzer::new(meta, config).unwrap();

        // 1.99秒截断为1秒，仍在上限内
        analyzer.process_block(&sine_block(1, 150, 0.5)).unwrap();
        analyzer.process_block(&sine_block(1, 49, 0.5)).unwrap();
        assert_eq!(analyzer.frames(), 199);

        let result = analyzer.process_block(&sine_block(1, 1, 0.5));
        assert!(matches!(
            result,
            Err(AudioError::AudioTooLong {
                duration_secs: 2,
                limit_secs: 1
            })
        ));
    }

    #[test]
    fn test_duration_exactly_at_cap_is_accepted() {
        let config = AnalyzerConfig {
            max_duration_secs: Some(3),
        };
        let meta = TrackMetadata::new(2, 100, 0, "pcm_s16le", 3);
        let mut analyzer = TrackAnalyzer::new(meta, config).unwrap();
        analyzer.process_block(&sine_block(2, 300, 0.5)).unwrap();
        analyzer.process_block(&sine_block(2, 50, 0.5)).unwrap();

        let report = analyzer.finish().unwrap();
        assert_eq!(report.frames, 350);
        assert_eq!(report.duration_secs, 3);
    }

    #[test]
    fn test_inconsistent_blocks_rejected() {
        let mut analyzer =
            TrackAnalyzer::new(metadata(2, 8000), AnalyzerConfig::default()).unwrap();
        analyzer.process_block(&sine_block(2, 10, 0.5)).unwrap();

        let other_encoding =
            SampleBlock::interleaved(2, SampleData::S16(vec![0; 20])).unwrap();
        assert!(matches!(
            analyzer.process_block(&other_encoding),
            Err(AudioError::BadSampleFormat(_))
        ));

        let wrong_channels = sine_block(1, 10, 0.5);
        assert!(matches!(
            analyzer.process_block(&wrong_channels),
            Err(AudioError::BadSampleFormat(_))
        ));
    }

    #[test]
    fn test_report_fields() {
        let mut analyzer =
            TrackAnalyzer::new(metadata(2, 400), AnalyzerConfig::default()).unwrap();
        // 10秒
        analyzer.process_block(&sine_block(2, 4000, 0.8)).unwrap();
        let report = analyzer.finish().unwrap();

        assert_eq!(report.frames, 4000);
        assert_eq!(report.duration_secs, 10);
        assert_eq!(report.waveform.bytes.len(), 40);
        assert_eq!(report.reported_channels, 2);
        assert!(!report.false_stereo);
        assert_eq!(report.dr.channels.len(), 2);
        assert!(report.trimmed_secs <= report.duration_secs);
        assert_eq!(report.format_id(), "pcm_s16le-0");
    }

    #[test]
    fn test_replay_is_deterministic() {
        let blocks: Vec<SampleBlock> = (0..5).map(|i| sine_block(2, 700 + i * 13, 0.3)).collect();
        let run = || {
            let mut analyzer =
                TrackAnalyzer::new(metadata(2, 1000), AnalyzerConfig::default()).unwrap();
            for block in &blocks {
                analyzer.process_block(block).unwrap();
            }
            analyzer.finish().unwrap()
        };

        let first = run();
        let second = run();
        assert_eq!(first.waveform.bytes, second.waveform.bytes);
        assert_eq!(first.dr_text(), second.dr_text());
        assert_eq!(first, second);
    }
}
