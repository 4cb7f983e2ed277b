//! 波形块聚合
//!
//! 把每帧各声道绝对值之和累加到约250毫秒的时间块中。
//! 这里只携带原始和，归一化在渲染阶段完成。

use crate::tools::constants::waveform::CHUNKS_PER_SECOND;

/// 按时间顺序追加的块能量序列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveformChunkSeries {
    chunks: Vec<f64>,
}

impl WaveformChunkSeries {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, value: f64) {
        self.chunks.push(value);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl From<Vec<f64>> for WaveformChunkSeries {
    fn from(chunks: Vec<f64>) -> Self {
        Self { chunks }
    }
}

/// 波形块聚合器
#[derive(Debug, Clone)]
pub struct WaveformAggregator {
    chunk_size: u64,
    accumulator: f64,
    counter: u64,
    series: WaveformChunkSeries,
}

impl WaveformAggregator {
    /// 块大小为 `sample_rate / 4` 帧（至少1帧）
    pub fn new(sample_rate: u32) -> Self {
        Self {
            chunk_size: (sample_rate / CHUNKS_PER_SECOND).max(1) as u64,
            accumulator: 0.0,
            counter: 0,
            series: WaveformChunkSeries::new(),
        }
    }

    #[inline]
    pub fn process_frame(&mut self, frame: &[f64]) {
        self.accumulator += frame.iter().map(|s| s.abs()).sum::<f64>();
        self.counter += 1;
        if self.counter == self.chunk_size {
            self.series.push(self.accumulator);
            self.accumulator = 0.0;
            self.counter = 0;
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// 结束聚合；末尾不满一块的帧被丢弃
    pub fn finish(self) -> WaveformChunkSeries {
        if self.counter > 0 {
            log::trace!("丢弃末尾不完整的波形块（{}帧）", self.counter);
        }
        self.series
    }
}
