//! # stats 命令实现
//!
//! - `indexing`: 多物相 GrainSpotter 指标化统计
//! - `tth-hist`: GVE 的 2θ 直方图（文本 + 可选图片）
//!
//! ## 依赖关系
//! - 使用 `cli/stats.rs` 定义的参数
//! - 使用 `analysis/statistics.rs`, `analysis/histogram.rs`
//! - 使用 `tabled` 输出物相汇总表

use crate::analysis::histogram::{plot_histogram, tth_histogram};
use crate::analysis::statistics::{indexing_statistics, IndexingStatistics, PhaseInput};
use crate::cli::stats::{IndexingArgs, StatsArgs, StatsCommands, TthHistArgs};
use crate::error::{GrainkitError, Result};
use crate::parsers::grainspotter::parse_grainspotter_file;
use crate::parsers::gs_input::parse_gs_input_file;
use crate::parsers::peak_table::parse_gve_file;
use crate::parsers::{source_name, write_file, BogusGrainPolicy};
use crate::utils::output;

use tabled::Table;

const PLOT_WIDTH: u32 = 1200;
const PLOT_HEIGHT: u32 = 800;

/// 执行 stats 命令
pub fn execute(args: StatsArgs) -> Result<()> {
    match args.command {
        StatsCommands::Indexing(args) => execute_indexing(args),
        StatsCommands::TthHist(args) => execute_tth_hist(args),
    }
}

fn execute_indexing(args: IndexingArgs) -> Result<()> {
    let n = args.input.len();
    if args.log.len() != n || args.gve.len() != n {
        return Err(GrainkitError::InvalidArgument(format!(
            "got {} input, {} log and {} g-vector files; give one of each per phase",
            n,
            args.log.len(),
            args.gve.len()
        )));
    }

    let mut phases = Vec::with_capacity(n);
    for ((ini, log), gve) in args.input.iter().zip(&args.log).zip(&args.gve) {
        phases.push(PhaseInput {
            log_name: source_name(log),
            grains: parse_grainspotter_file(log, BogusGrainPolicy::Abort)?,
            input: parse_gs_input_file(ini)?,
            gve: parse_gve_file(gve)?,
        });
    }

    let stats = indexing_statistics(&phases, args.wavelength)?;
    print_statistics(&stats);
    Ok(())
}

fn print_statistics(stats: &IndexingStatistics) {
    output::print_header("Indexing statistics");
    println!("{}", Table::new(&stats.phases));
    println!();

    output::print_info(&format!("Predicted reflections: {}", stats.windows.len()));
    for w in &stats.windows {
        println!(
            "  ({:>3} {:>3} {:>3})  2θ = {:>8.4}°  d* = {:.4} [{:.4}, {:.4}]",
            w.hkl[0], w.hkl[1], w.hkl[2], w.tth, w.ds, w.ds_min, w.ds_max
        );
    }
    println!();

    output::print_info(&format!("G-vectors in the files: {}", stats.gvectors));
    output::print_info(&format!(
        "G-vectors within the GrainSpotter ranges: {}",
        stats.in_range
    ));
    output::print_info(&format!(
        "G-vectors that can be assigned to a reflection: {}",
        stats.assignable
    ));
    output::print_info(&format!(
        "G-vectors indexed: {} in {} grains",
        stats.total_indexed(),
        stats.total_grains()
    ));
    output::print_info(&format!(
        "G-vectors left: {}",
        stats.remaining()
    ));
    output::print_separator();
    output::print_done(&format!(
        "Indexed {:.1}% of the assignable g-vectors",
        stats.indexed_percent()
    ));
}

fn execute_tth_hist(args: TthHistArgs) -> Result<()> {
    let gve = parse_gve_file(&args.gve)?;
    let hist = tth_histogram(&gve, args.wavelength, args.nbins)?;
    output::print_info(&format!(
        "{} g-vectors in {} bins of {:.4}°",
        hist.npeaks,
        hist.counts.len(),
        hist.bin_width
    ));

    write_file(&args.output, &hist.to_text())?;
    output::print_saved("Histogram", &args.output);

    if let Some(plot) = &args.plot {
        plot_histogram(&hist, plot, PLOT_WIDTH, PLOT_HEIGHT)?;
        output::print_saved("Histogram plot", plot);
    }
    Ok(())
}
