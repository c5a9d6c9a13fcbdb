//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `grains`: 晶粒文件操作（嵌套子命令）
//!   - `clean`, `merge`, `compare`, `euler`, `check-euler`, `info`
//! - `peaks`: 峰表操作（嵌套子命令）
//!   - `remove-indexed`, `select`, `check`
//! - `stats`: 统计（嵌套子命令）
//!   - `indexing`, `tth-hist`
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: grains, peaks, stats

pub mod grains;
pub mod peaks;
pub mod stats;

use crate::orientation;
use clap::{Parser, Subcommand, ValueEnum};

/// Grainkit - 多晶 3D-XRD 晶粒与衍射峰工具箱
#[derive(Parser)]
#[command(name = "grainkit")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Grain and peak toolkit for multigrain 3D-XRD (GrainSpotter, ImageD11)",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Work with grain files (.log, .gff, .ubi): clean, merge, compare, Euler angles
    Grains(grains::GrainsArgs),

    /// Work with peak tables (.flt, .gve) against indexed grains
    Peaks(peaks::PeaksArgs),

    /// Indexing statistics and 2theta histograms
    Stats(stats::StatsArgs),
}

/// 晶系（可用名称或 1-7 编号）
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CrystalSystemArg {
    #[value(alias = "1")]
    Triclinic,
    #[value(alias = "2")]
    Monoclinic,
    #[value(alias = "3")]
    Orthorhombic,
    #[value(alias = "4")]
    Tetragonal,
    #[value(alias = "5")]
    Trigonal,
    #[value(alias = "6")]
    Hexagonal,
    #[value(alias = "7")]
    Cubic,
}

impl From<CrystalSystemArg> for orientation::CrystalSystem {
    fn from(arg: CrystalSystemArg) -> Self {
        use orientation::CrystalSystem as C;
        match arg {
            CrystalSystemArg::Triclinic => C::Triclinic,
            CrystalSystemArg::Monoclinic => C::Monoclinic,
            CrystalSystemArg::Orthorhombic => C::Orthorhombic,
            CrystalSystemArg::Tetragonal => C::Tetragonal,
            CrystalSystemArg::Trigonal => C::Trigonal,
            CrystalSystemArg::Hexagonal => C::Hexagonal,
            CrystalSystemArg::Cubic => C::Cubic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_crystal_system_number_alias() {
        let cli = Cli::try_parse_from([
            "grainkit", "grains", "merge", "a.log", "b.log", "-c", "7",
        ])
        .unwrap();
        let Commands::Grains(args) = cli.command else {
            panic!("expected grains command");
        };
        let grains::GrainsCommands::Merge(merge) = args.command else {
            panic!("expected merge");
        };
        assert_eq!(merge.crystal_system, CrystalSystemArg::Cubic);
        assert_eq!(merge.output_stem, "merge");
        assert!((merge.misorientation - 2.0).abs() < 1e-12);
        assert!(!merge.skip_bogus);
    }
}
