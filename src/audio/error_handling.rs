//! 错误处理模块
//!
//! 提供统一的symphonia错误处理宏（仅供pcm_engine内部使用）

/// 统一的symphonia解码错误处理宏
///
/// - `ResetRequired`：重置解码器，跳过当前包
/// - `UnexpectedEof`：流结束，从所在函数返回 `Ok(None)`
/// - `DecodeError`：损坏包，跳过
/// - 其他：作为不可恢复的解码错误返回
macro_rules! handle_symphonia_error {
    ($result:expr, $decoder:expr) => {
        match $result {
            Ok(value) => Some(value),
            Err(symphonia::core::errors::Error::ResetRequired) => {
                $decoder.reset();
                None
            }
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                return Ok(None);
            }
            Err(symphonia::core::errors::Error::DecodeError(msg)) => {
                log::debug!("跳过损坏的音频包 / skipping corrupt packet: {msg}");
                None
            }
            Err(e) => return Err($crate::error::decoding_error("symphonia解码失败", e)),
        }
    };
}

pub(super) use handle_symphonia_error;
