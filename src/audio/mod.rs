//! 音频解码模块
//!
//! 解码协作方：打开容器、捕获音轨元数据与标签，并逐块交付解码单元。

// 内部子模块
mod error_handling;
mod format;
mod pcm_engine;
mod streaming;

pub use format::{TrackMetadata, TrackTags};
pub use pcm_engine::{SUPPORTED_EXTENSIONS, SymphoniaSource};
pub use streaming::{FrameSource, MemorySource};
