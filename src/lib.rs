//! WavePlot Imager
//!
//! 从解码后的音频帧流中生成两样东西：一行紧凑的波形亮度值（0-200，每250毫秒一个），
//! 以及一个描述峰值与平均电平余量的动态范围（DR）评级。同时检测名义上是立体声、
//! 实际左右声道几乎相同的"伪立体声"音轨，并把它们报告为单声道。
//!
//! ## 核心流程
//! - 样本归一化：16/32位整数、32/64位浮点 → 闭区间 [-1, 1] 的 f64
//! - 逐帧送入伪立体声检测、3秒窗口DR统计、250毫秒波形聚合
//! - 流结束后：DR = 20·log10(参考峰值 / 最响20%窗口的RMS)，波形平滑、归一化、裁切静音
//! - 按固定的标记协议输出

pub mod audio;
pub mod core;
pub mod error;
pub mod processing;
pub mod tools;

// 重新导出核心类型
pub use audio::{FrameSource, MemorySource, SymphoniaSource, TrackMetadata, TrackTags};
pub use core::{DrResult, RenderedWaveform};
pub use error::{AudioError, AudioResult};
pub use processing::{AnalysisReport, AnalyzerConfig, SampleBlock, SampleData, TrackAnalyzer};
