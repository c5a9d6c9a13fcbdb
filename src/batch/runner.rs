//! # 批量执行器
//!
//! 在独立的 rayon 线程池中处理文件列表，显示进度并汇总结果。
//!
//! ## 依赖关系
//! - 被 `commands/grains.rs` 使用
//! - 使用 `utils/progress.rs`

use crate::error::{GrainkitError, Result};
use crate::utils::progress;

use rayon::prelude::*;
use std::path::PathBuf;

/// 单个文件的处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult {
    Success(String),
    /// 跳过（如输出已存在）
    Skipped(String),
    /// (文件路径, 错误信息)
    Failed(String, String),
}

/// 批量处理统计
#[derive(Debug, Default)]
pub struct BatchResult {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    pub messages: Vec<String>,
    pub failures: Vec<(String, String)>,
}

impl BatchResult {
    pub fn merge(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Success(msg) => {
                self.success += 1;
                self.messages.push(msg);
            }
            ProcessResult::Skipped(msg) => {
                self.skipped += 1;
                self.messages.push(msg);
            }
            ProcessResult::Failed(path, err) => {
                self.failed += 1;
                self.failures.push((path, err));
            }
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.skipped + self.failed
    }
}

pub struct BatchRunner {
    jobs: usize,
}

impl BatchRunner {
    /// `jobs == 0` 时使用全部 CPU
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理文件列表，结果顺序与输入一致
    pub fn run<F>(&self, files: &[PathBuf], message: &str, processor: F) -> Result<BatchResult>
    where
        F: Fn(&PathBuf) -> ProcessResult + Sync + Send,
    {
        let pb = progress::create_progress_bar(files.len() as u64, message);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| GrainkitError::Other(format!("Failed to start thread pool: {}", e)))?;

        let results: Vec<ProcessResult> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let result = processor(file);
                    pb.inc(1);
                    result
                })
                .collect()
        });
        pb.finish_and_clear();

        let mut batch = BatchResult::default();
        for result in results {
            batch.merge(result);
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_collects_results() {
        let files: Vec<PathBuf> = ["a.log", "b.log", "c.log"].iter().map(PathBuf::from).collect();
        let runner = BatchRunner::new(2);
        let result = runner
            .run(&files, "Testing", |f| match f.to_str() {
                Some("a.log") => ProcessResult::Success("a".into()),
                Some("b.log") => ProcessResult::Skipped("b".into()),
                _ => ProcessResult::Failed(f.display().to_string(), "bad".into()),
            })
            .unwrap();

        assert_eq!(result.total(), 3);
        assert_eq!((result.success, result.skipped, result.failed), (1, 1, 1));
        assert_eq!(result.failures[0].0, "c.log");
        assert_eq!(result.messages, vec!["a", "b"]);
    }
}
