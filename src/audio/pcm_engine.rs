//! PCM处理引擎模块
//!
//! 基于symphonia的解码协作方：打开容器、选择第一条音频轨道、
//! 捕获元数据与标签，并把每个解码包转换为平面布局的 [`SampleBlock`]。

use super::error_handling::handle_symphonia_error;
use super::format::{TrackMetadata, TrackTags};
use super::streaming::FrameSource;
use crate::error::{self, AudioError, AudioResult};
use crate::processing::{SampleBlock, SampleData, SampleEncoding};
use std::path::{Path, PathBuf};
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{
    CODEC_TYPE_AAC, CODEC_TYPE_MP3, CODEC_TYPE_NULL, CODEC_TYPE_OPUS, CODEC_TYPE_VORBIS,
    CodecParameters, CodecType, Decoder, DecoderOptions,
};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey, Tag};
use symphonia::core::probe::Hint;

/// 可识别的音频文件扩展名（批量扫描使用）
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "wav", "flac", "mp3", "mp1", "m4a", "aac", "ogg", "oga", "aiff", "aif", "mka", "mkv", "webm",
];

/// symphonia帧源
pub struct SymphoniaSource {
    path: PathBuf,
    metadata: TrackMetadata,
    tags: TrackTags,
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    finished: bool,
}

impl SymphoniaSource {
    /// 打开音频文件并准备解码
    pub fn open<P: AsRef<Path>>(path: P) -> AudioResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = std::fs::File::open(&path)
            .map_err(|e| AudioError::OpenInput(format!("{}: {e}", path.display())))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension() {
            hint.with_extension(&extension.to_string_lossy());
        }

        let mut probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::OpenInput(format!("格式探测失败 / probe failed: {e}")))?;

        let mut tags = TrackTags::default();
        if let Some(metadata) = probed.metadata.get()
            && let Some(revision) = metadata.current()
        {
            collect_tags(revision.tags(), &mut tags);
        }

        let mut format_reader = probed.format;
        if let Some(revision) = format_reader.metadata().current() {
            collect_tags(revision.tags(), &mut tags);
        }

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(AudioError::NoAudioStream)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let metadata = build_metadata(&path, &codec_params)?;

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::CodecOpen(format!("创建解码器失败: {e}")))?;

        log::info!(
            "Format String: {} ({} Hz, {} ch, {} s)",
            metadata.format_id(),
            metadata.sample_rate,
            metadata.channels,
            metadata.duration_secs
        );

        Ok(Self {
            path,
            metadata,
            tags,
            format_reader,
            decoder,
            track_id,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 逐包解码，直到拿到一个非空单元或流结束
    fn decode_next(&mut self) -> AudioResult<Option<SampleBlock>> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(error::decoding_error("读取音频包失败", e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            if let Some(audio_buf) = handle_symphonia_error!(self.decoder.decode(&packet), self.decoder)
                && let Some(block) = convert_buffer_to_block(&audio_buf)?
            {
                return Ok(Some(block));
            }
        }
    }
}

impl FrameSource for SymphoniaSource {
    fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    fn next_block(&mut self) -> AudioResult<Option<SampleBlock>> {
        if self.finished {
            return Ok(None);
        }
        let block = self.decode_next()?;
        if block.is_none() {
            self.finished = true;
        }
        Ok(block)
    }

    fn tags(&self) -> TrackTags {
        self.tags.clone()
    }
}

/// 从编解码参数构造音轨元数据
fn build_metadata(path: &Path, params: &CodecParameters) -> AudioResult<TrackMetadata> {
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| AudioError::StreamInfo("无法获取采样率 / missing sample rate".to_string()))?;
    let channels = params
        .channels
        .map(|ch| ch.count())
        .ok_or_else(|| AudioError::StreamInfo("无法获取声道数 / missing channel count".to_string()))?;
    let channels = u16::try_from(channels)
        .map_err(|_| AudioError::StreamInfo(format!("声道数过多: {channels}")))?;

    let codec_id = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|descriptor| descriptor.short_name.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let duration_secs = estimate_duration_secs(params, sample_rate);
    let bit_rate = calculate_bitrate(path, params, sample_rate, channels, duration_secs);

    let metadata = TrackMetadata::new(channels, sample_rate, bit_rate, codec_id, duration_secs);
    metadata.validate()?;
    Ok(metadata)
}

/// 近似时长（整秒，截断）；未知时为0
fn estimate_duration_secs(params: &CodecParameters, sample_rate: u32) -> u32 {
    let Some(n_frames) = params.n_frames else {
        return 0;
    };
    let seconds = match params.time_base {
        Some(time_base) => time_base.calc_time(n_frames).seconds,
        None if sample_rate > 0 => n_frames / sample_rate as u64,
        None => 0,
    };
    u32::try_from(seconds).unwrap_or(u32::MAX)
}

fn is_lossy_codec_type(codec_type: CodecType) -> bool {
    matches!(
        codec_type,
        CODEC_TYPE_AAC | CODEC_TYPE_MP3 | CODEC_TYPE_VORBIS | CODEC_TYPE_OPUS
    )
}

/// 比特率（bit/s）
///
/// 有损格式：文件大小÷时长；无损格式：采样率×声道×位深。
/// 有损格式时长未知时返回0。
fn calculate_bitrate(
    path: &Path,
    params: &CodecParameters,
    sample_rate: u32,
    channels: u16,
    duration_secs: u32,
) -> u32 {
    if is_lossy_codec_type(params.codec) {
        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        if duration_secs == 0 {
            return 0;
        }
        ((file_size as f64 * 8.0) / duration_secs as f64).round() as u32
    } else {
        sample_rate
            .saturating_mul(channels as u32)
            .saturating_mul(detect_bit_depth(params))
    }
}

fn detect_bit_depth(params: &CodecParameters) -> u32 {
    use symphonia::core::codecs::*;

    if let Some(bits) = params.bits_per_sample {
        return bits;
    }
    match params.codec {
        CODEC_TYPE_PCM_S24LE | CODEC_TYPE_PCM_S24BE => 24,
        CODEC_TYPE_PCM_S32LE
        | CODEC_TYPE_PCM_S32BE
        | CODEC_TYPE_PCM_F32LE
        | CODEC_TYPE_PCM_F32BE => 32,
        CODEC_TYPE_PCM_F64LE | CODEC_TYPE_PCM_F64BE => 64,
        _ => 16,
    }
}

/// 提取MusicBrainz标识与序号，已有值不覆盖
fn collect_tags(source: &[Tag], tags: &mut TrackTags) {
    for tag in source {
        let slot = match tag.std_key {
            Some(StandardTagKey::MusicBrainzRecordingId) => &mut tags.recording_id,
            Some(StandardTagKey::MusicBrainzAlbumId) => &mut tags.release_id,
            Some(StandardTagKey::TrackNumber) => &mut tags.track_number,
            Some(StandardTagKey::DiscNumber) => &mut tags.disc_number,
            _ => continue,
        };
        if slot.is_some() {
            continue;
        }
        let raw = tag.value.to_string();
        *slot = match tag.std_key {
            Some(StandardTagKey::TrackNumber) | Some(StandardTagKey::DiscNumber) => {
                TrackTags::normalize_index(&raw)
            }
            _ => Some(raw.trim().to_string()).filter(|s| !s.is_empty()),
        };
    }
}

/// 把symphonia缓冲区转换为平面布局的解码单元
///
/// 24位样本左移8位放入32位容器；无符号格式与8位有符号格式被拒绝。
/// 空缓冲区返回 `None`。
fn convert_buffer_to_block(audio_buf: &AudioBufferRef) -> AudioResult<Option<SampleBlock>> {
    macro_rules! planar {
        ($buf:expr, $convert:expr) => {{
            let channels = $buf.spec().channels.count();
            let frames = $buf.frames();
            let mut data = Vec::with_capacity(channels * frames);
            for ch in 0..channels {
                data.extend($buf.chan(ch).iter().map($convert));
            }
            (channels, frames, data)
        }};
    }

    let (channels, frames, data) = match audio_buf {
        AudioBufferRef::S16(buf) => {
            let (c, f, d) = planar!(buf, |&s: &i16| s);
            (c, f, SampleData::S16(d))
        }
        AudioBufferRef::S24(buf) => {
            let (c, f, d) = planar!(buf, |s: &symphonia::core::sample::i24| s.inner() << 8);
            (c, f, SampleData::S32(d))
        }
        AudioBufferRef::S32(buf) => {
            let (c, f, d) = planar!(buf, |&s: &i32| s);
            (c, f, SampleData::S32(d))
        }
        AudioBufferRef::F32(buf) => {
            let (c, f, d) = planar!(buf, |&s: &f32| s);
            (c, f, SampleData::F32(d))
        }
        AudioBufferRef::F64(buf) => {
            let (c, f, d) = planar!(buf, |&s: &f64| s);
            (c, f, SampleData::F64(d))
        }
        AudioBufferRef::U8(_) => return SampleEncoding::U8.ensure_supported().map(|_| None),
        AudioBufferRef::U16(_) => return Err(unrecognised("u16")),
        AudioBufferRef::U24(_) => return Err(unrecognised("u24")),
        AudioBufferRef::U32(_) => return Err(unrecognised("u32")),
        AudioBufferRef::S8(_) => return Err(unrecognised("s8")),
    };

    if frames == 0 {
        return Ok(None);
    }
    SampleBlock::planar(channels, data).map(Some)
}

fn unrecognised(name: &str) -> AudioError {
    error::bad_sample_format("无法识别的样本格式 / unrecognised sample format", name)
}
