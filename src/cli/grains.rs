//! # grains 子命令 CLI 定义
//!
//! 晶粒文件相关操作：
//! - `clean`: 删除 GrainSpotter 日志中的空晶粒
//! - `merge`: 合并多次 GrainSpotter 指标化结果
//! - `compare`: 对比两组晶粒
//! - `shared-peaks`: 两个日志中晶粒共用的 g-vector
//! - `euler`: 导出 Euler 角
//! - `check-euler`: 检查 Euler 角与 U 矩阵是否一致
//! - `info`: 晶粒列表概览
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/grains.rs`

use super::CrystalSystemArg;
use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

/// grains 主命令参数
#[derive(Args, Debug)]
pub struct GrainsArgs {
    #[command(subcommand)]
    pub command: GrainsCommands,
}

#[derive(Subcommand, Debug)]
pub enum GrainsCommands {
    /// Remove bogus grains (0 peaks) from GrainSpotter logs and renumber the rest
    Clean(CleanArgs),

    /// Merge grains from multiple GrainSpotter indexings
    Merge(MergeArgs),

    /// Compare grains between a reference file and a test file
    Compare(CompareArgs),

    /// List grains of two GrainSpotter logs that share g-vectors
    SharedPeaks(SharedPeaksArgs),

    /// Export Euler angles (phi1 Phi phi2) for MTEX or as CSV
    Euler(EulerArgs),

    /// Check that Euler angles reproduce the U matrices
    CheckEuler(CheckEulerArgs),

    /// Print a summary table of the grains in a file
    Info(InfoArgs),
}

// ─────────────────────────────────────────────────────────────
// clean
// ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// GrainSpotter log file, or a directory of logs
    pub input: PathBuf,

    /// Output file (single input) or suffix appended to each file stem (directory input)
    #[arg(short, long, default_value = "clean.log")]
    pub output: PathBuf,

    /// File pattern for directory input (comma separated)
    #[arg(long, default_value = "*.log")]
    pub pattern: String,

    /// Search subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Overwrite existing output files
    #[arg(long)]
    pub overwrite: bool,

    /// Number of parallel jobs (0 = all CPUs)
    #[arg(short, long, default_value_t = 0, env = "GRAINKIT_JOBS")]
    pub jobs: usize,
}

// ─────────────────────────────────────────────────────────────
// merge
// ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// GrainSpotter log files
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Crystal system (name or 1-7)
    #[arg(short, long, value_enum)]
    pub crystal_system: CrystalSystemArg,

    /// Stem for output files
    #[arg(short, long, default_value = "merge")]
    pub output_stem: String,

    /// Misorientation below which two grains are identical (degrees)
    #[arg(short, long, default_value_t = 2.0)]
    pub misorientation: f64,

    /// Skip bogus grains (0 peaks) instead of stopping
    #[arg(short, long)]
    pub skip_bogus: bool,
}

// ─────────────────────────────────────────────────────────────
// compare
// ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Reference grain file (.log, .gff or .ubi)
    pub file1: PathBuf,

    /// Grain file matched against the reference (.log, .gff or .ubi)
    pub file2: PathBuf,

    /// Crystal system (name or 1-7)
    #[arg(short, long, value_enum)]
    pub crystal_system: CrystalSystemArg,

    /// Stem for output files
    #[arg(short, long, default_value = "comp")]
    pub output_stem: String,

    /// Misorientation below which two grains are identical (degrees)
    #[arg(short, long, default_value_t = 2.0)]
    pub misorientation: f64,

    /// Also write every pairwise comparison to <stem>-verbose.dat
    #[arg(short, long)]
    pub verbose: bool,
}

// ─────────────────────────────────────────────────────────────
// shared-peaks
// ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct SharedPeaksArgs {
    /// First GrainSpotter log, used as the reference
    pub file1: PathBuf,

    /// Second GrainSpotter log
    pub file2: PathBuf,

    /// Crystal system (name or 1-7)
    #[arg(short, long, value_enum)]
    pub crystal_system: CrystalSystemArg,

    /// Stem for the output log (<stem>-log.dat)
    #[arg(short, long, default_value = "comp")]
    pub output_stem: String,

    /// Misorientation below which two grains are identical (degrees)
    #[arg(short, long, default_value_t = 2.0)]
    pub misorientation: f64,
}

// ─────────────────────────────────────────────────────────────
// euler
// ─────────────────────────────────────────────────────────────

/// Euler 角输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum EulerFormat {
    /// `phi1 Phi phi2` per line, for MTEX
    Txt,
    /// CSV with grain name and peak count
    Csv,
}

#[derive(Args, Debug)]
pub struct EulerArgs {
    /// Grain file (.log, .gff or .ubi)
    pub input: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "euler_angles.txt")]
    pub output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = EulerFormat::Txt)]
    pub format: EulerFormat,
}

// ─────────────────────────────────────────────────────────────
// check-euler / info
// ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct CheckEulerArgs {
    /// Grain file (.log, .gff or .ubi)
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Grain file (.log, .gff or .ubi)
    pub input: PathBuf,

    /// Skip bogus grains (0 peaks) instead of stopping
    #[arg(short, long)]
    pub skip_bogus: bool,
}
