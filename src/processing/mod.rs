//! 音频处理模块
//!
//! 样本归一化与布局遍历，以及把各核心算法串起来的单音轨分析协调器。

pub mod processing_coordinator;
pub mod sample_conversion;

// 重新导出公共接口
pub use processing_coordinator::{AnalysisReport, AnalyzerConfig, TrackAnalyzer};
pub use sample_conversion::{
    NormalizeSample, SampleBlock, SampleData, SampleEncoding, SampleFormat, SampleLayout,
};
