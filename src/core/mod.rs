//! 核心算法模块
//!
//! 包含DR计算、伪立体声检测、波形聚合与渲染的数据结构和算法实现。

pub mod channel_balance;
pub mod dr_calculator;
pub mod renderer;
pub mod waveform;

// 重新导出公共接口
pub use channel_balance::ChannelBalanceTracker;
pub use dr_calculator::{ChannelDr, DrResult, DynamicRangeEstimator};
pub use renderer::{RenderedWaveform, TrimRange};
pub use waveform::{WaveformAggregator, WaveformChunkSeries};
