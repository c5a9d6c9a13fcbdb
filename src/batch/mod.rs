//! # 批量处理模块
//!
//! 对目录中的多个晶粒文件并行执行同一操作（如清理 GrainSpotter 日志）。
//!
//! ## 依赖关系
//! - 被 `commands/grains.rs` 使用
//! - 使用 `walkdir` + `glob` 收集文件，`rayon` 并行，`indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchRunner, ProcessResult};
