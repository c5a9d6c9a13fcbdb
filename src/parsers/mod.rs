//! # 解析器模块
//!
//! 晶粒文件（GrainSpotter `.log`、`.gff`、`.ubi`）、峰表（`.flt`、`.gve`）
//! 和 GrainSpotter 输入文件的解析与写出。
//!
//! ## 依赖关系
//! - 被 `commands/` 和 `analysis/` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: grainspotter, gff, ubi, peak_table, gs_input

pub mod gff;
pub mod grainspotter;
pub mod gs_input;
pub mod peak_table;
pub mod ubi;

use crate::error::{GrainkitError, Result};
use crate::models::Grain;
use std::fs;
use std::path::Path;

/// 遇到峰数小于 1 的晶粒时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BogusGrainPolicy {
    /// 报错并停止解析
    Abort,
    /// 丢弃该晶粒，继续解析后续晶粒
    Skip,
}

/// 从文件扩展名推断格式并解析晶粒
pub fn parse_grains(path: &Path, policy: BogusGrainPolicy) -> Result<Vec<Grain>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "log" => grainspotter::parse_grainspotter_file(path, policy),
        "gff" => gff::parse_gff_file(path),
        "ubi" => ubi::parse_ubi_file(path),
        _ => Err(GrainkitError::UnsupportedFormat(format!(
            "Cannot determine grain file format for: {} (expected .log, .gff or .ubi)",
            path.display()
        ))),
    }
}

/// 读取整个文件
pub(crate) fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| GrainkitError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 写入整个文件
pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| GrainkitError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 错误信息和晶粒来源中使用的文件名
pub(crate) fn source_name(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension_is_error() {
        let err = parse_grains(Path::new("grains.txt"), BogusGrainPolicy::Abort).unwrap_err();
        assert!(matches!(err, GrainkitError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_dispatch_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ubi");
        fs::write(&path, "4 0 0\n0 4 0\n0 0 4\n").unwrap();
        let grains = parse_grains(&path, BogusGrainPolicy::Abort);
        // 单位取向 Φ = 0，Euler 角无法分离
        assert!(matches!(grains, Err(GrainkitError::DegenerateOrientation(_))));

        let path = dir.path().join("missing.log");
        let err = parse_grains(&path, BogusGrainPolicy::Skip).unwrap_err();
        assert!(matches!(err, GrainkitError::FileReadError { .. }));
    }
}
