//! # peaks 子命令 CLI 定义
//!
//! 峰表（.flt / .gve）与 GrainSpotter 日志的交叉操作：
//! - `remove-indexed`: 从 GVE 或 FLT 删除已指标化的峰
//! - `select`: 从 FLT 中选出已指标化的峰
//! - `check`: 检查日志与 GVE 是否一致
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/peaks.rs`

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// peaks 主命令参数
#[derive(Args, Debug)]
pub struct PeaksArgs {
    #[command(subcommand)]
    pub command: PeaksCommands,
}

#[derive(Subcommand, Debug)]
pub enum PeaksCommands {
    /// Write a new GVE or FLT without the peaks already assigned to grains
    RemoveIndexed(RemoveIndexedArgs),

    /// Write a new FLT with only the peaks assigned to grains
    Select(SelectArgs),

    /// Check that a GrainSpotter log was indexed from a given GVE file
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct RemoveIndexedArgs {
    /// GrainSpotter log file
    pub log: PathBuf,

    /// Peak file (.gve or .flt) used for indexing
    pub old_peaks: PathBuf,

    /// Peak file to create, same format as the input
    pub new_peaks: PathBuf,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// GrainSpotter log file
    pub log: PathBuf,

    /// FLT file used to generate the g-vectors
    pub old_flt: PathBuf,

    /// FLT file to create
    pub new_flt: PathBuf,

    /// Also write one FLT per grain (<new-stem>-Grain-N.flt)
    #[arg(short = 'a', long)]
    pub save_all: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// GrainSpotter log file
    pub log: PathBuf,

    /// G-vector file
    pub gve: PathBuf,

    /// Wavelength (angstrom)
    #[arg(short, long)]
    pub wavelength: f64,
}
