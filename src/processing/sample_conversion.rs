//! 音频样本归一化引擎
//!
//! 把解码器原生的样本编码（16/32位有符号整数、32/64位浮点；交错或平面布局）
//! 转换为闭区间 [-1, 1] 内的 f64 标量。整数采用 `(x + 0.5) / (2^(n-1) - 0.5)`，
//! 两个端点恰好映射到 ±1.0。
//!
//! 格式×布局用带标签的枚举表达，缓冲区是按元素宽度类型化的 `Vec`，
//! 分发通过穷尽的 `match` 完成，不需要任何裸指针重解释。

use crate::error::{self, AudioError, AudioResult};

/// 解码器原生样本编码标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// 8位无符号整数（明确不支持）
    U8,
    /// 16位有符号整数
    S16,
    /// 32位有符号整数
    S32,
    /// 32位浮点
    F32,
    /// 64位浮点
    F64,
}

impl SampleEncoding {
    /// 拒绝不支持的编码（无符号8位家族）
    pub fn ensure_supported(self) -> AudioResult<Self> {
        match self {
            SampleEncoding::U8 => Err(error::bad_sample_format(
                "不支持无符号字节格式 / unsigned byte format not supported",
                "u8",
            )),
            other => Ok(other),
        }
    }

}

/// 样本内存布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLayout {
    /// 交错：第 i 帧第 c 声道位于 `i * channels + c`
    Interleaved,
    /// 平面：每个声道一段连续缓冲
    Planar,
}

/// 完整的样本格式标签（编码 × 布局）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleFormat {
    pub encoding: SampleEncoding,
    pub layout: SampleLayout,
}

/// 单个原生样本到规范标量的转换
pub trait NormalizeSample: Copy {
    fn normalize(self) -> f64;
}

impl NormalizeSample for i16 {
    #[inline]
    fn normalize(self) -> f64 {
        (self as f64 + 0.5) / 32767.5
    }
}

impl NormalizeSample for i32 {
    #[inline]
    fn normalize(self) -> f64 {
        (self as f64 + 0.5) / 2147483647.5
    }
}

impl NormalizeSample for f32 {
    #[inline]
    fn normalize(self) -> f64 {
        self as f64
    }
}

impl NormalizeSample for f64 {
    #[inline]
    fn normalize(self) -> f64 {
        self
    }
}

/// 按元素宽度类型化的样本缓冲
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    S16(Vec<i16>),
    S32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl SampleData {
    pub fn encoding(&self) -> SampleEncoding {
        match self {
            SampleData::S16(_) => SampleEncoding::S16,
            SampleData::S32(_) => SampleEncoding::S32,
            SampleData::F32(_) => SampleEncoding::F32,
            SampleData::F64(_) => SampleEncoding::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleData::S16(v) => v.len(),
            SampleData::S32(v) => v.len(),
            SampleData::F32(v) => v.len(),
            SampleData::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 一个解码单元：若干帧，每帧每声道一个样本
///
/// 平面布局时，各声道的数据在同一个扁平缓冲内按声道首尾相接：
/// 声道 c 占据 `[c * frames, (c + 1) * frames)`。
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    layout: SampleLayout,
    channels: usize,
    frames: usize,
    data: SampleData,
}

impl SampleBlock {
    /// 创建解码单元，验证缓冲长度等于 `frames * channels`
    pub fn new(layout: SampleLayout, channels: usize, data: SampleData) -> AudioResult<Self> {
        if channels == 0 {
            return Err(AudioError::InvalidInput("声道数不能为0".to_string()));
        }
        if data.len() % channels != 0 {
            return Err(AudioError::InvalidInput(format!(
                "样本数量({})必须是声道数({})的倍数",
                data.len(),
                channels
            )));
        }
        let frames = data.len() / channels;
        Ok(Self {
            layout,
            channels,
            frames,
            data,
        })
    }

    pub fn interleaved(channels: usize, data: SampleData) -> AudioResult<Self> {
        Self::new(SampleLayout::Interleaved, channels, data)
    }

    pub fn planar(channels: usize, data: SampleData) -> AudioResult<Self> {
        Self::new(SampleLayout::Planar, channels, data)
    }

    pub fn format(&self) -> SampleFormat {
        SampleFormat {
            encoding: self.data.encoding(),
            layout: self.layout,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn data(&self) -> &SampleData {
        &self.data
    }

    /// 布局遍历适配器：按流顺序逐帧回调归一化后的帧（每声道一个标量）
    ///
    /// 回调拿到的切片长度恒为 `channels`，在两次回调之间复用同一块内存。
    pub fn for_each_frame<F>(&self, mut f: F) -> AudioResult<()>
    where
        F: FnMut(&[f64]) -> AudioResult<()>,
    {
        let mut frame = vec![0.0f64; self.channels];
        match &self.data {
            SampleData::S16(buf) => self.walk(buf, &mut frame, &mut f),
            SampleData::S32(buf) => self.walk(buf, &mut frame, &mut f),
            SampleData::F32(buf) => self.walk(buf, &mut frame, &mut f),
            SampleData::F64(buf) => self.walk(buf, &mut frame, &mut f),
        }
    }

    fn walk<T, F>(&self, buf: &[T], frame: &mut [f64], f: &mut F) -> AudioResult<()>
    where
        T: NormalizeSample,
        F: FnMut(&[f64]) -> AudioResult<()>,
    {
        let channels = self.channels;
        let frames = self.frames;
        for i in 0..frames {
            for (channel, slot) in frame.iter_mut().enumerate() {
                let index = match self.layout {
                    SampleLayout::Interleaved => i * channels + channel,
                    SampleLayout::Planar => channel * frames + i,
                };
                *slot = buf[index].normalize();
            }
            f(frame)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_frames(block: &SampleBlock) -> Vec<Vec<f64>> {
        let mut frames = Vec::new();
        block
            .for_each_frame(|frame| {
                frames.push(frame.to_vec());
                Ok(())
            })
            .unwrap();
        frames
    }

    #[test]
    fn test_i16_range_every_value() {
        let mut prev = f64::NEG_INFINITY;
        for raw in i16::MIN..=i16::MAX {
            let v = raw.normalize();
            assert!((-1.0..=1.0).contains(&v), "{raw} -> {v}");
            assert!(v > prev, "归一化必须严格单调递增");
            prev = v;
        }
        assert_eq!(i16::MIN.normalize(), -1.0);
        assert_eq!(i16::MAX.normalize(), 1.0);
    }

    #[test]
    fn test_i32_extremes() {
        assert_eq!(i32::MIN.normalize(), -1.0);
        assert_eq!(i32::MAX.normalize(), 1.0);
        assert!(0i32.normalize() > 0.0);
        assert!((-1i32).normalize() < 0.0);

        let mut prev = f64::NEG_INFINITY;
        for raw in [i32::MIN, i32::MIN + 1, -65536, -1, 0, 1, 65536, i32::MAX - 1, i32::MAX] {
            let v = raw.normalize();
            assert!((-1.0..=1.0).contains(&v), "{raw} -> {v}");
            assert!(v > prev, "{raw} 不单调");
            prev = v;
        }
    }

    #[test]
    fn test_float_passthrough() {
        assert_eq!(0.25f32.normalize(), 0.25);
        assert_eq!((-0.75f64).normalize(), -0.75);
    }

    #[test]
    fn test_u8_rejected() {
        assert!(matches!(
            SampleEncoding::U8.ensure_supported(),
            Err(AudioError::BadSampleFormat(_))
        ));
        assert_eq!(
            SampleEncoding::S16.ensure_supported().unwrap(),
            SampleEncoding::S16
        );
    }

    #[test]
    fn test_interleaved_and_planar_yield_same_frames() {
        let interleaved =
            SampleBlock::interleaved(2, SampleData::F32(vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3]))
                .unwrap();
        let planar =
            SampleBlock::planar(2, SampleData::F32(vec![0.1, 0.2, 0.3, -0.1, -0.2, -0.3]))
                .unwrap();

        assert_eq!(interleaved.frames(), 3);
        assert_eq!(planar.frames(), 3);
        assert_eq!(collect_frames(&interleaved), collect_frames(&planar));
        assert_eq!(collect_frames(&planar)[1], vec![0.2f32 as f64, -0.2f32 as f64]);
    }

    #[test]
    fn test_block_length_must_match_channels() {
        let result = SampleBlock::interleaved(2, SampleData::S16(vec![1, 2, 3]));
        assert!(matches!(result, Err(AudioError::InvalidInput(_))));
        assert!(SampleBlock::planar(0, SampleData::S16(vec![])).is_err());
    }

    #[test]
    fn test_format_tag() {
        let block = SampleBlock::planar(1, SampleData::S32(vec![0, 1])).unwrap();
        assert_eq!(
            block.format(),
            SampleFormat {
                encoding: SampleEncoding::S32,
                layout: SampleLayout::Planar
            }
        );
    }

    #[test]
    fn test_callback_error_stops_walk() {
        let block = SampleBlock::interleaved(1, SampleData::S16(vec![0; 10])).unwrap();
        let mut seen = 0;
        let result = block.for_each_frame(|_| {
            seen += 1;
            if seen == 3 {
                Err(AudioError::NoSamples)
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(seen, 3);
    }
}
