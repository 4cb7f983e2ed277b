//! 扫描台账
//!
//! 记录每个已成功分析文件的协议版本与时间，批量模式据此跳过
//! 已用当前版本扫描过的文件。台账是一个JSON文件。

use crate::error::AudioResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 台账时间格式（精确到分钟）
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 单个文件的扫描记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub version: String,
    pub date: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    entries: BTreeMap<String, LedgerEntry>,
}

/// 扫描台账
#[derive(Debug)]
pub struct ScanLedger {
    path: PathBuf,
    file: LedgerFile,
}

impl ScanLedger {
    /// 读取台账；文件不存在时返回空台账
    pub fn load(path: &Path) -> AudioResult<Self> {
        let file = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerFile::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.file.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&LedgerEntry> {
        self.file.entries.get(key)
    }

    /// 该文件是否已用给定版本扫描过
    pub fn is_current(&self, key: &str, version: &str) -> bool {
        self.get(key).is_some_and(|entry| entry.version == version)
    }

    /// 记录一次成功扫描
    pub fn record(&mut self, key: impl Into<String>, version: &str, at: DateTime<Utc>) {
        self.file.entries.insert(
            key.into(),
            LedgerEntry {
                version: version.to_string(),
                date: at.format(DATE_FORMAT).to_string(),
            },
        );
    }

    /// 写回磁盘
    pub fn save(&self) -> AudioResult<()> {
        let json = serde_json::to_vec_pretty(&self.file)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_missing_file_is_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ScanLedger::load(&dir.path().join("ledger.json")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_record_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 17, 5, 42).unwrap();

        let mut ledger = ScanLedger::load(&path).unwrap();
        ledger.record("/music/a.flac", "CITRUS", at);
        ledger.save().unwrap();

        let reloaded = ScanLedger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(
            reloaded.get("/music/a.flac"),
            Some(&LedgerEntry {
                version: "CITRUS".to_string(),
                date: "2024-03-09 17:05".to_string(),
            })
        );
        assert!(reloaded.is_current("/music/a.flac", "CITRUS"));
        assert!(!reloaded.is_current("/music/a.flac", "BANANA"));
        assert!(!reloaded.is_current("/music/b.flac", "CITRUS"));
    }

    #[test]
    fn test_corrupt_ledger_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(ScanLedger::load(&path).is_err());
    }
}
