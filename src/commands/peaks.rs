//! # peaks 命令实现
//!
//! 根据 GrainSpotter 日志处理峰表。
//!
//! ## 依赖关系
//! - 使用 `cli/peaks.rs` 定义的参数
//! - 使用 `parsers/grainspotter.rs`, `parsers/peak_table.rs`
//! - 使用 `analysis/peak_selection.rs`, `analysis/checks.rs`

use crate::analysis::checks::{check_peaks_against_gve, PeakIssue};
use crate::analysis::peak_selection::{
    per_grain_peak_tables, remove_indexed_peaks, select_grain_peaks, RemovalSummary,
};
use crate::cli::peaks::{CheckArgs, PeaksArgs, PeaksCommands, RemoveIndexedArgs, SelectArgs};
use crate::error::{GrainkitError, Result};
use crate::parsers::grainspotter::parse_grainspotter_file;
use crate::parsers::peak_table::{
    parse_flt_file, parse_gve_file, parse_peak_table_file, peak_table_kind, save_peak_table,
};
use crate::parsers::BogusGrainPolicy;
use crate::utils::output;

use std::path::{Path, PathBuf};

/// 执行 peaks 命令
pub fn execute(args: PeaksArgs) -> Result<()> {
    match args.command {
        PeaksCommands::RemoveIndexed(args) => execute_remove_indexed(args),
        PeaksCommands::Select(args) => execute_select(args),
        PeaksCommands::Check(args) => execute_check(args),
    }
}

fn execute_remove_indexed(args: RemoveIndexedArgs) -> Result<()> {
    let summary = remove_indexed_file(&args.log, &args.old_peaks, &args.new_peaks)?;
    if summary.assigned > summary.removed {
        output::print_warning(&format!(
            "{} peaks are assigned to more than one grain",
            summary.assigned - summary.removed
        ));
    }
    output::print_info(&format!(
        "Removed {} indexed peaks, {} left",
        summary.removed, summary.remaining
    ));
    output::print_saved("New peak file", &args.new_peaks);
    Ok(())
}

/// 读取 `old`（.gve 或 .flt），删除日志中引用的峰后写到 `new`
fn remove_indexed_file(log: &Path, old: &Path, new: &Path) -> Result<RemovalSummary> {
    // 输出格式必须与输入一致，读文件前先检查
    if peak_table_kind(new)? != peak_table_kind(old)? {
        return Err(GrainkitError::InvalidArgument(format!(
            "{} and {} must have the same extension",
            old.display(),
            new.display()
        )));
    }

    let grains = parse_grainspotter_file(log, BogusGrainPolicy::Abort)?;
    let mut table = parse_peak_table_file(old)?;
    output::print_info(&format!(
        "{}: {} grains, {}: {} peaks",
        log.display(),
        grains.len(),
        old.display(),
        table.len()
    ));

    let summary = remove_indexed_peaks(&grains, &mut table)?;
    if table.is_empty() {
        output::print_warning("Every peak was indexed, the new file has no data rows");
    }
    save_peak_table(new, &table)?;
    Ok(summary)
}

fn execute_select(args: SelectArgs) -> Result<()> {
    let grains = parse_grainspotter_file(&args.log, BogusGrainPolicy::Abort)?;
    let flt = parse_flt_file(&args.old_flt)?;
    output::print_info(&format!(
        "{}: {} grains, {}: {} peaks",
        args.log.display(),
        grains.len(),
        args.old_flt.display(),
        flt.len()
    ));

    let selected = select_grain_peaks(&grains, &flt)?;
    output::print_info(&format!("Selected {} indexed peaks", selected.len()));
    save_peak_table(&args.new_flt, &selected)?;
    output::print_saved("New peak file", &args.new_flt);

    if args.save_all {
        let tables = per_grain_peak_tables(&grains, &flt)?;
        for (name, table) in &tables {
            save_peak_table(&grain_flt_path(&args.new_flt, name), table)?;
        }
        output::print_success(&format!(
            "Saved {} per-grain peak files next to {}",
            tables.len(),
            args.new_flt.display()
        ));
    }
    Ok(())
}

/// `out/new.flt` + `Grain-3` -> `out/new-Grain-3.flt`
fn grain_flt_path(new_flt: &Path, grain_name: &str) -> PathBuf {
    let stem = new_flt
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    new_flt.with_file_name(format!("{}-{}.flt", stem, grain_name))
}

fn execute_check(args: CheckArgs) -> Result<()> {
    if args.wavelength <= 0.0 {
        return Err(GrainkitError::InvalidArgument(format!(
            "wavelength must be positive, got {}",
            args.wavelength
        )));
    }

    let grains = parse_grainspotter_file(&args.log, BogusGrainPolicy::Abort)?;
    let gve = parse_gve_file(&args.gve)?;
    let report = check_peaks_against_gve(&grains, &gve, args.wavelength)?;

    if report.is_consistent() {
        output::print_success(&format!(
            "{} peaks of {} grains are consistent with {}",
            report.checked,
            grains.len(),
            args.gve.display()
        ));
        return Ok(());
    }

    for issue in &report.issues {
        output::print_warning(&describe_issue(issue));
    }
    if report.truncated {
        output::print_warning("Too many errors, stopping");
    }

    Err(GrainkitError::Other(format!(
        "{} was not indexed from {}",
        args.log.display(),
        args.gve.display()
    )))
}

fn describe_issue(issue: &PeakIssue) -> String {
    match issue {
        PeakIssue::Missing { grain, peak_id } => {
            format!("{}: peak {} is not in the g-vector file", grain, peak_id)
        }
        PeakIssue::Mismatch {
            grain,
            peak_id,
            expected,
            found,
        } => format!(
            "{}: peak {} has eta={:.2} omega={:.2} ds={:.4} in the log \
             but eta={:.2} omega={:.2} ds={:.4} in the g-vector file",
            grain, peak_id, expected[0], expected[1], expected[2], found[0], found[1], found[2]
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::grainspotter::{sample_block, sample_log};
    use crate::parsers::peak_table::{SAMPLE_FLT, SAMPLE_GVE};
    use std::fs;

    fn write_log(dir: &Path, peak_ids: &[i64]) -> PathBuf {
        let path = dir.join("run.log");
        let log = sample_log(&[sample_block(1, peak_ids, [10.0, 20.0, 30.0])]);
        fs::write(&path, log).unwrap();
        path
    }

    #[test]
    fn test_remove_indexed_from_flt() {
        let dir = tempfile::tempdir().unwrap();
        let log = write_log(dir.path(), &[11, 13]);
        let old = dir.path().join("old.flt");
        let new = dir.path().join("new.flt");
        fs::write(&old, SAMPLE_FLT).unwrap();

        let summary = remove_indexed_file(&log, &old, &new).unwrap();
        assert_eq!((summary.removed, summary.remaining), (2, 1));

        let table = parse_flt_file(&new).unwrap();
        assert_eq!(table.ids(), vec![12]);
        assert_eq!(table.header(), parse_flt_file(&old).unwrap().header());
    }

    #[test]
    fn test_remove_indexed_from_gve() {
        let dir = tempfile::tempdir().unwrap();
        let log = write_log(dir.path(), &[102]);
        let old = dir.path().join("old.gve");
        let new = dir.path().join("new.gve");
        fs::write(&old, SAMPLE_GVE).unwrap();

        remove_indexed_file(&log, &old, &new).unwrap();
        let table = parse_gve_file(&new).unwrap();
        assert_eq!(table.ids(), vec![101, 103]);
        assert_eq!(table.predicted_reflections().len(), 3);
    }

    #[test]
    fn test_remove_indexed_rejects_format_change() {
        let dir = tempfile::tempdir().unwrap();
        let log = write_log(dir.path(), &[11]);
        let old = dir.path().join("old.flt");
        fs::write(&old, SAMPLE_FLT).unwrap();

        let err = remove_indexed_file(&log, &old, &dir.path().join("new.gve")).unwrap_err();
        assert!(matches!(err, GrainkitError::InvalidArgument(_)));
        assert!(!dir.path().join("new.gve").exists());
    }

    #[test]
    fn test_grain_flt_path() {
        assert_eq!(
            grain_flt_path(Path::new("out/sel.flt"), "Grain-3"),
            PathBuf::from("out/sel-Grain-3.flt")
        );
    }

    #[test]
    fn test_describe_missing_issue() {
        let text = describe_issue(&PeakIssue::Missing {
            grain: "Grain-2".to_string(),
            peak_id: 42,
        });
        assert_eq!(text, "Grain-2: peak 42 is not in the g-vector file");
    }
}
