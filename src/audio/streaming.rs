//! 流式解码接口模块
//!
//! 定义分析流水线与解码协作方之间的接缝：
//! 元数据在打开时一次性给出，之后按流顺序逐个交付解码单元。

use super::format::{TrackMetadata, TrackTags};
use crate::error::AudioResult;
use crate::processing::SampleBlock;
use std::collections::VecDeque;

/// 解码帧源trait
///
/// # 数据约定
///
/// - **变长块**：块大小由编解码器/容器决定，不保证固定长度
/// - **格式一致**：同一条流的所有块应使用相同的编码与布局，
///   不一致时由分析器报告 `BadSampleFormat`
/// - **EOF 语义**：返回 `Ok(None)` 后再次调用应继续返回 `None`
///
/// 单线程顺序消费，不要求 `Send`。
pub trait FrameSource {
    /// 打开时捕获的音轨元数据
    fn metadata(&self) -> &TrackMetadata;

    /// 获取下一个解码单元
    ///
    /// - `Ok(Some(block))` - 成功解码一个单元
    /// - `Ok(None)` - 流结束
    /// - `Err(_)` - 不可恢复的解码失败
    fn next_block(&mut self) -> AudioResult<Option<SampleBlock>>;

    /// 容器中的标签（不支持标签的源返回空集）
    fn tags(&self) -> TrackTags {
        TrackTags::default()
    }
}

/// 内存帧源：按顺序交付预先准备好的解码单元
///
/// 用于合成信号分析以及测试中替代真实解码器。
#[derive(Debug, Clone)]
pub struct MemorySource {
    metadata: TrackMetadata,
    tags: TrackTags,
    blocks: VecDeque<SampleBlock>,
}

impl MemorySource {
    pub fn new(metadata: TrackMetadata, blocks: Vec<SampleBlock>) -> Self {
        Self {
            metadata,
            tags: TrackTags::default(),
            blocks: blocks.into(),
        }
    }

    pub fn with_tags(mut self, tags: TrackTags) -> Self {
        self.tags = tags;
        self
    }

    /// 剩余未交付的单元数
    pub fn remaining(&self) -> usize {
        self.blocks.len()
    }
}

impl FrameSource for MemorySource {
    fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    fn next_block(&mut self) -> AudioResult<Option<SampleBlock>> {
        Ok(self.blocks.pop_front())
    }

    fn tags(&self) -> TrackTags {
        self.tags.clone()
    }
}
