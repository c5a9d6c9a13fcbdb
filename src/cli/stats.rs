//! # stats 子命令 CLI 定义
//!
//! - `indexing`: GrainSpotter 指标化统计（支持多物相）
//! - `tth-hist`: 由 GVE 计算 2θ 直方图
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/stats.rs`

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// stats 主命令参数
#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(subcommand)]
    pub command: StatsCommands,
}

#[derive(Subcommand, Debug)]
pub enum StatsCommands {
    /// Indexing statistics from GrainSpotter inputs, logs and g-vector files
    #[command(after_help = "\
For multiple phases give the input, log and g-vector files of every phase in the same order:
  grainkit stats indexing -w 0.2989 -i a.ini b.ini -l a.log b.log -g a.gve b.gve")]
    Indexing(IndexingArgs),

    /// Two-theta histogram of the g-vectors in a GVE file
    TthHist(TthHistArgs),
}

#[derive(Args, Debug)]
pub struct IndexingArgs {
    /// GrainSpotter input files, one per phase (use the loosest conditions)
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// GrainSpotter log files, one per phase
    #[arg(short, long, required = true, num_args = 1..)]
    pub log: Vec<PathBuf>,

    /// G-vector files, one per phase
    #[arg(short, long, required = true, num_args = 1..)]
    pub gve: Vec<PathBuf>,

    /// Wavelength (angstrom)
    #[arg(short, long)]
    pub wavelength: f64,
}

#[derive(Args, Debug)]
pub struct TthHistArgs {
    /// G-vector file
    pub gve: PathBuf,

    /// Wavelength (angstrom)
    #[arg(short, long)]
    pub wavelength: f64,

    /// Output text file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of bins
    #[arg(short, long, default_value_t = 1000)]
    pub nbins: usize,

    /// Also plot the histogram (PNG, or SVG by extension)
    #[arg(long)]
    pub plot: Option<PathBuf>,
}
