//! 工具函数模块
//!
//! 提供文件路径处理等通用工具函数。

/// 文件路径处理工具函数
pub mod path {
    use std::path::Path;

    /// 提取文件名（返回String，用于日志显示）
    #[inline]
    pub fn extract_filename_lossy(path: &Path) -> String {
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// 小写扩展名
    #[inline]
    pub fn extension_lowercase(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// 台账与提交记录中使用的路径键
    pub fn path_key(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }
}

pub use path::{extension_lowercase, extract_filename_lossy, path_key};
