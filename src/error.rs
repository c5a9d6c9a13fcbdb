//! # 统一错误处理模块
//!
//! 定义 Grainkit 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// Grainkit 统一错误类型
#[derive(Error, Debug)]
pub enum GrainkitError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 格式错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Failed to parse {format} file: {path} (line {line})\nReason: {reason}")]
    LineError {
        format: String,
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 一致性错误
    // ─────────────────────────────────────────────────────────────
    #[error("Grain {grain} in {path} has only {npeaks} peaks, something is wrong with this GrainSpotter output")]
    BogusGrain {
        path: String,
        grain: usize,
        npeaks: i64,
    },

    #[error("Grain {grain} in {path} claims {expected} peaks but {found} were found")]
    PeakCountMismatch {
        path: String,
        grain: usize,
        expected: usize,
        found: usize,
    },

    #[error("Peak {id} not found in {path}{}", referenced_by(.context))]
    PeakNotFound {
        id: i64,
        path: String,
        context: Option<String>,
    },

    #[error("Duplicate spot3d_id {id} in {path} (line {line})")]
    DuplicatePeakId { id: i64, path: String, line: usize },

    #[error("Found {count} matching grains in {reference} for {grain} of {path}")]
    AmbiguousMatch {
        grain: String,
        path: String,
        reference: String,
        count: usize,
    },

    // ─────────────────────────────────────────────────────────────
    // 数值错误
    // ─────────────────────────────────────────────────────────────
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    #[error("Degenerate orientation: {0}")]
    DegenerateOrientation(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

fn referenced_by(context: &Option<String>) -> String {
    context
        .as_ref()
        .map(|c| format!(" (referenced by {})", c))
        .unwrap_or_default()
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, GrainkitError>;

impl GrainkitError {
    /// 构造带行号的格式错误
    pub fn line(format: &str, path: &str, line: usize, reason: impl Into<String>) -> Self {
        GrainkitError::LineError {
            format: format.to_string(),
            path: path.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_not_found_message() {
        let err = GrainkitError::PeakNotFound {
            id: 999,
            path: "peaks.gve".to_string(),
            context: Some("Grain-3".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Peak 999 not found in peaks.gve (referenced by Grain-3)"
        );

        let err = GrainkitError::PeakNotFound {
            id: 999,
            path: "peaks.gve".to_string(),
            context: None,
        };
        assert_eq!(err.to_string(), "Peak 999 not found in peaks.gve");
    }

    #[test]
    fn test_line_error_message() {
        let err = GrainkitError::line("flt", "a.flt", 12, "wrong number of fields");
        assert!(err.to_string().contains("(line 12)"));
        assert!(err.to_string().contains("wrong number of fields"));
    }
}
