//! 输出协议编解码模块
//!
//! 单文件模式的输出是一段字节流，顺序固定：
//!
//! ```text
//! WAVEPLOT_START <波形字节> WAVEPLOT_DR <DR文本> WAVEPLOT_INFO <时长>|<裁切时长>|<格式>|<声道数> WAVEPLOT_END
//! ```
//!
//! 标记与INFO行都是不带长度前缀的ASCII文本，波形块的长度即块数。

use super::constants::protocol::{INFO_SEPARATOR, MARKER_DR, MARKER_END, MARKER_INFO, MARKER_START};
use crate::error::{AudioError, AudioResult};
use crate::processing::AnalysisReport;
use std::io::Write;

/// 把分析结果写成输出协议
///
/// 纯序列化，只在上游全部成功后调用。
pub fn write_waveplot_output<W: Write>(writer: &mut W, report: &AnalysisReport) -> AudioResult<()> {
    writer.write_all(&encode_waveplot_output(report))?;
    writer.flush()?;
    Ok(())
}

/// 编码到内存
pub fn encode_waveplot_output(report: &AnalysisReport) -> Vec<u8> {
    let dr_text = report.dr_text();
    let info = info_line(report);
    let mut buffer = Vec::with_capacity(
        MARKER_START.len()
            + report.waveform.bytes.len()
            + MARKER_DR.len()
            + dr_text.len()
            + MARKER_INFO.len()
            + info.len()
            + MARKER_END.len(),
    );
    buffer.extend_from_slice(MARKER_START.as_bytes());
    buffer.extend_from_slice(&report.waveform.bytes);
    buffer.extend_from_slice(MARKER_DR.as_bytes());
    buffer.extend_from_slice(dr_text.as_bytes());
    buffer.extend_from_slice(MARKER_INFO.as_bytes());
    buffer.extend_from_slice(info.as_bytes());
    buffer.extend_from_slice(MARKER_END.as_bytes());
    buffer
}

fn info_line(report: &AnalysisReport) -> String {
    format!(
        "{}{sep}{}{sep}{}{sep}{}",
        report.duration_secs,
        report.trimmed_secs,
        report.format_id(),
        report.reported_channels,
        sep = INFO_SEPARATOR
    )
}

/// 解析后的输出协议
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub waveform: Vec<u8>,
    /// 原样保留的DR文本（一位小数）
    pub dr_text: String,
    pub dr: f64,
    pub duration_secs: u32,
    pub trimmed_secs: u32,
    pub format_id: String,
    pub channels: u32,
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

fn missing_marker(marker: &str) -> AudioError {
    AudioError::InvalidInput(format!("输出协议缺少标记 / missing marker {marker}"))
}

fn parse_field<T: std::str::FromStr>(field: &str, name: &str) -> AudioResult<T> {
    field
        .trim()
        .parse()
        .map_err(|_| AudioError::InvalidInput(format!("无效的{name}字段 / bad {name}: {field:?}")))
}

/// 解析输出协议
///
/// 波形字节可能恰好组成某个标记，因此 `WAVEPLOT_DR` 之后的标记都从尾部向前查找：
/// DR文本和INFO行不会包含标记文本，最后一次出现的位置一定是真正的分隔点。
pub fn parse_waveplot_output(bytes: &[u8]) -> AudioResult<ParsedOutput> {
    let start =
        find_subslice(bytes, MARKER_START.as_bytes()).ok_or_else(|| missing_marker(MARKER_START))?;
    let body = &bytes[start + MARKER_START.len()..];

    let end = rfind_subslice(body, MARKER_END.as_bytes()).ok_or_else(|| missing_marker(MARKER_END))?;
    let body = &body[..end];

    let info_at =
        rfind_subslice(body, MARKER_INFO.as_bytes()).ok_or_else(|| missing_marker(MARKER_INFO))?;
    let info = &body[info_at + MARKER_INFO.len()..];
    let body = &body[..info_at];

    let dr_at = rfind_subslice(body, MARKER_DR.as_bytes()).ok_or_else(|| missing_marker(MARKER_DR))?;
    let dr_bytes = &body[dr_at + MARKER_DR.len()..];
    let waveform = body[..dr_at].to_vec();

    let dr_text = std::str::from_utf8(dr_bytes)
        .map_err(|e| AudioError::InvalidInput(format!("DR文本不是UTF-8: {e}")))?
        .to_string();
    let dr = parse_field(&dr_text, "DR")?;

    let info = std::str::from_utf8(info)
        .map_err(|e| AudioError::InvalidInput(format!("INFO行不是UTF-8: {e}")))?;
    let fields: Vec<&str> = info.split(INFO_SEPARATOR).collect();
    let [duration, trimmed, format_id, channels] = fields.as_slice() else {
        return Err(AudioError::InvalidInput(format!(
            "INFO行应有4个字段 / INFO needs 4 fields: {info:?}"
        )));
    };

    Ok(ParsedOutput {
        waveform,
        dr_text,
        dr,
        duration_secs: parse_field(duration, "duration")?,
        trimmed_secs: parse_field(trimmed, "trimmed")?,
        format_id: (*format_id).to_string(),
        channels: parse_field(channels, "channels")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::TrackMetadata;
    use crate::core::{DrResult, RenderedWaveform, TrimRange};

    fn report(bytes: Vec<u8>, rating: f64) -> AnalysisReport {
        AnalysisReport {
            metadata: TrackMetadata::new(2, 44100, 1411200, "pcm_s16le", 183),
            waveform: RenderedWaveform {
                bytes,
                trim: Some(TrimRange { start: 4, end: 700 }),
                silent: false,
            },
            dr: DrResult {
                channels: Vec::new(),
                rating,
            },
            reported_channels: 1,
            false_stereo: true,
            channel_delta: Some(0.0),
            frames: 44100 * 183,
            duration_secs: 183,
            trimmed_secs: 174,
        }
    }

    #[test]
    fn test_exact_layout() {
        let encoded = encode_waveplot_output(&report(vec![0, 100, 200], 12.345));
        let mut expected = b"WAVEPLOT_START".to_vec();
        expected.extend_from_slice(&[0, 100, 200]);
        expected.extend_from_slice(b"WAVEPLOT_DR12.3WAVEPLOT_INFO183|174|pcm_s16le-1411200|1WAVEPLOT_END");
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_writer_matches_encoder() {
        let report = report(vec![1, 2, 3], 7.0);
        let mut written = Vec::new();
        write_waveplot_output(&mut written, &report).unwrap();
        assert_eq!(written, encode_waveplot_output(&report));
    }

    #[test]
    fn test_writer_error_is_propagated() {
        struct BrokenPipe;
        impl Write for BrokenPipe {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let result = write_waveplot_output(&mut BrokenPipe, &report(vec![1], 7.0));
        assert!(matches!(result, Err(AudioError::IoError(_))));
    }

    #[test]
    fn test_parse_emitted_stream() {
        let encoded = encode_waveplot_output(&report(vec![5, 6, 7, 8], 9.96));
        let parsed = parse_waveplot_output(&encoded).unwrap();
        assert_eq!(parsed.waveform, vec![5, 6, 7, 8]);
        assert_eq!(parsed.dr_text, "10.0");
        assert_eq!(parsed.duration_secs, 183);
        assert_eq!(parsed.trimmed_secs, 174);
        assert_eq!(parsed.format_id, "pcm_s16le-1411200");
        assert_eq!(parsed.channels, 1);
    }

    #[test]
    fn test_waveform_containing_marker_text() {
        // 所有标记字符都在0-200范围内，波形里可能出现标记文本
        let mut waveform = b"WAVEPLOT_DR".to_vec();
        waveform.extend_from_slice(b"WAVEPLOT_INFO");
        waveform.push(3);
        let encoded = encode_waveplot_output(&report(waveform.clone(), 7.0));
        let parsed = parse_waveplot_output(&encoded).unwrap();
        assert_eq!(parsed.waveform, waveform);
        assert_eq!(parsed.dr_text, "7.0");
    }

    #[test]
    fn test_parse_ignores_leading_noise() {
        let mut stream = b"garbage".to_vec();
        stream.extend(encode_waveplot_output(&report(vec![1], 3.0)));
        assert_eq!(parse_waveplot_output(&stream).unwrap().waveform, vec![1]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_waveplot_output(b"nothing here").is_err());
        assert!(parse_waveplot_output(b"WAVEPLOT_STARTWAVEPLOT_DR1.0WAVEPLOT_INFO1|2|x").is_err());
        assert!(
            parse_waveplot_output(b"WAVEPLOT_STARTWAVEPLOT_DR1.0WAVEPLOT_INFO1|2|xWAVEPLOT_END")
                .is_err()
        );
    }
}
