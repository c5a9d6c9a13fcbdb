//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `analysis/`, `batch/`, `utils/`
//! - 子模块: grains, peaks, stats

pub mod grains;
pub mod peaks;
pub mod stats;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Grains(args) => grains::execute(args),
        Commands::Peaks(args) => peaks::execute(args),
        Commands::Stats(args) => stats::execute(args),
    }
}
