//! # 进度条工具
//!
//! 基于 `indicatif` 的进度条，用于批处理和两两比较。
//!
//! ## 依赖关系
//! - 被 `commands/` 和 `batch/` 使用
//! - 使用 `indicatif` crate

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// 已知总数的进度条
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// 总数未知的长任务（如两两取向比较）
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {elapsed_precise} {msg}")
            .unwrap()
            .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
