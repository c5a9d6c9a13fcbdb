//! # 文件收集器
//!
//! 单个文件直接返回；目录则按 glob 模式（逗号分隔）收集，可递归。
//!
//! ## 依赖关系
//! - 被 `commands/grains.rs` 使用
//! - 使用 `walkdir` 遍历目录，`glob::Pattern` 匹配文件名

use crate::error::{GrainkitError, Result};

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct FileCollector {
    input: PathBuf,
    patterns: Vec<Pattern>,
    recursive: bool,
    /// 文件名以这些后缀结尾的文件不收集（如上一次的输出）
    exclude_suffixes: Vec<String>,
}

impl FileCollector {
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: Vec::new(),
            recursive: false,
            exclude_suffixes: Vec::new(),
        }
    }

    /// 设置匹配模式，如 `*.log` 或 `grains-*.log,*.gff`
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Pattern::new(s).map_err(|e| {
                    GrainkitError::InvalidArgument(format!("invalid pattern '{}': {}", s, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn excluding_suffix(mut self, suffix: &str) -> Self {
        self.exclude_suffixes.push(suffix.to_string());
        self
    }

    pub fn is_single_file(&self) -> bool {
        self.input.is_file()
    }

    /// 收集所有匹配的文件（按路径排序）
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if self.input.is_file() {
            return Ok(vec![self.input.clone()]);
        }
        if !self.input.is_dir() {
            return Err(GrainkitError::FileNotFound {
                path: self.input.display().to_string(),
            });
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.matches(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();
        Ok(files)
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if self.exclude_suffixes.iter().any(|s| name.ends_with(s.as_str())) {
            return false;
        }
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_with_patterns() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.log", "b.log", "c.gff", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("d.log"), "").unwrap();

        let files = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.log")
            .unwrap()
            .collect()
            .unwrap();
        assert_eq!(files.len(), 2);

        let files = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.log, *.gff")
            .unwrap()
            .recursive(true)
            .excluding_suffix("b.log")
            .collect()
            .unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.log", "c.gff", "d.log"]);
    }

    #[test]
    fn test_single_file_and_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.log");
        fs::write(&file, "").unwrap();

        let collector = FileCollector::new(file.clone());
        assert!(collector.is_single_file());
        assert_eq!(collector.collect().unwrap(), vec![file]);

        let missing = FileCollector::new(dir.path().join("nope"));
        assert!(missing.collect().is_err());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(FileCollector::new(PathBuf::from(".")).with_pattern("[").is_err());
    }
}
