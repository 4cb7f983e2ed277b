//! 边界和异常测试
//!
//! 测试异常输入在真实解码路径上的错误分类与退出码


use audio_test_fixtures::{ensure_fixtures_generated, fixture_path};
use std::path::Path;
use waveplot_imager::error::exit_codes;
use waveplot_imager::tools::analyze_file;
use waveplot_imager::{AnalyzerConfig, AudioError, SymphoniaSource};

fn log(msg_zh: impl AsRef<str>, msg_en: impl AsRef<str>) {
    println!("{} / {}", msg_zh.as_ref(), msg_en.as_ref());
}

fn analyze_path(path: &Path) -> Result<(), AudioError> {
    analyze_file(path, AnalyzerConfig::default()).map(|_| ())
}

#[test]
fn test_missing_file_fails_to_open() {
    let result = analyze_path(Path::new("tests/fixtures/does_not_exist.wav"));

    match result {
        Err(e @ AudioError::OpenInput(_)) => {
            assert_eq!(e.exit_code(), exit_codes::OPEN_INPUT);
            log(format!("  ✓ {e}"), "  ✓ missing file rejected");
        }
        other => panic!("不存在的文件应返回 OpenInput, got {other:?}"),
    }
}

#[test]
fn test_fake_audio_fails_to_open() {
    ensure_fixtures_generated();
    let result = SymphoniaSource::open(&fixture_path("fake_audio.wav"));

    match result {
        Err(e) => assert_eq!(e.exit_code(), exit_codes::OPEN_INPUT),
        Ok(_) => panic!("文本文件不应被识别为音频 / text file must not probe as audio"),
    }
}

#[test]
fn test_empty_file_fails_to_open() {
    ensure_fixtures_generated();
    let result = analyze_path(&fixture_path("empty.wav"));

    let error = result.expect_err("空文件必须被拒绝");
    assert_eq!(error.exit_code(), exit_codes::OPEN_INPUT);
}

#[test]
fn test_zero_length_audio_has_no_samples() {
    ensure_fixtures_generated();
    let result = analyze_path(&fixture_path("zero_length.wav"));

    // 只有头的WAV：能打开但解码不到任何帧；个别容器层实现会在探测阶段拒绝
    let error = result.expect_err("零长度文件必须被拒绝");
    assert!(
        matches!(
            error,
            AudioError::NoSamples | AudioError::OpenInput(_) | AudioError::NoAudioStream
        ),
        "零长度文件应返回 NoSamples, got {error:?}"
    );
    if matches!(error, AudioError::NoSamples) {
        assert_eq!(error.exit_code(), exit_codes::NO_SAMPLES);
    }
}

#[test]
fn test_zero_duration_cap_means_unlimited() {
    ensure_fixtures_generated();
    let config = AnalyzerConfig {
        max_duration_secs: None,
    };

    let result = analyze_file(&fixture_path("stereo_sine.wav"), config);
    assert!(result.is_ok(), "不限时长时应成功: {:?}", result.err());
}

#[test]
fn test_directory_is_not_a_track() {
    let dir = tempfile::tempdir().unwrap();
    let result = analyze_path(dir.path());

    let error = result.expect_err("目录不能作为单条音轨打开");
    assert_eq!(error.exit_code(), exit_codes::OPEN_INPUT);
}
