//! # 报告日志
//!
//! 同时打印到终端并写入 `<stem>-log.dat` 的报告输出。
//!
//! ## 依赖关系
//! - 被 `commands/grains.rs` 使用

use crate::error::{GrainkitError, Result};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 打印并记录报告行
pub struct ReportLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl ReportLog {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| GrainkitError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(ReportLog {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 输出一行
    pub fn line(&mut self, text: &str) -> Result<()> {
        println!("{}", text);
        writeln!(self.writer, "{}", text).map_err(|e| self.write_error(e))
    }

    pub fn lines<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<()> {
        for l in lines {
            self.line(l.as_ref())?;
        }
        Ok(())
    }

    pub fn blank(&mut self) -> Result<()> {
        self.line("")
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush().map_err(|e| self.write_error(e))
    }

    fn write_error(&self, e: std::io::Error) -> GrainkitError {
        GrainkitError::FileWriteError {
            path: self.path.display().to_string(),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_log_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comp-log.dat");

        let mut log = ReportLog::create(&path).unwrap();
        log.line("Parsed a.log, found 3 grains").unwrap();
        log.blank().unwrap();
        log.lines(&["- 2 grains were indexed 1 times"]).unwrap();
        log.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Parsed a.log, found 3 grains\n\n- 2 grains were indexed 1 times\n"
        );
    }
}
