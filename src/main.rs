//! # Grainkit - 多晶 3D-XRD 晶粒与衍射峰工具箱
//!
//! 读写 GrainSpotter / ImageD11 的晶粒文件和峰表，统一成单一可执行文件。
//!
//! ## 子命令
//! - `grains` - 晶粒文件
//!   - `clean`, `merge`, `compare`, `euler`, `check-euler`, `info`
//! - `peaks` - 峰表
//!   - `remove-indexed`, `select`, `check`
//! - `stats` - 统计
//!   - `indexing`, `tth-hist`
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/          (命令行参数定义)
//!   ├── commands/     (命令执行逻辑)
//!   │     ├── analysis/    (去重、对比、统计)
//!   │     ├── batch/       (批量并行处理)
//!   │     ├── parsers/     (格式解析与写出)
//!   │     ├── models/      (晶粒、峰表数据模型)
//!   │     └── orientation/ (矩阵、Euler 角、晶体对称)
//!   ├── utils/        (工具函数)
//!   └── error.rs      (错误处理)
//! ```

mod analysis;
mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod orientation;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
