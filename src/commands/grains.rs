//! # grains 命令实现
//!
//! 晶粒文件的清理、合并、对比与 Euler 角导出。
//!
//! ## 功能
//! - `clean`: 单个日志或整个目录（并行）去除空晶粒并重新编号
//! - `merge`: 合并多个日志，统计每个唯一晶粒的指标化次数
//! - `compare`: 参考 vs 测试晶粒对比，输出 `.dat` 报告
//! - `shared-peaks`: 两个日志中共用 g-vector 的晶粒
//! - `euler` / `check-euler` / `info`
//!
//! ## 依赖关系
//! - 使用 `cli/grains.rs` 定义的参数
//! - 使用 `parsers/`, `analysis/`, `batch/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`, `utils/report.rs`

use crate::analysis::checks::check_euler_angles;
use crate::analysis::compare::compare_grains;
use crate::analysis::merge::merge_grains;
use crate::analysis::shared_peaks::shared_peaks;
use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::grains::{
    CheckEulerArgs, CleanArgs, CompareArgs, EulerArgs, EulerFormat, GrainsArgs, GrainsCommands,
    InfoArgs, MergeArgs, SharedPeaksArgs,
};
use crate::error::{GrainkitError, Result};
use crate::models::Grain;
use crate::orientation::matrix::format_matrix;
use crate::orientation::CrystalSystem;
use crate::parsers::grainspotter::{parse_grainspotter_file, save_grainspotter};
use crate::parsers::{self, source_name, write_file, BogusGrainPolicy};
use crate::utils::report::ReportLog;
use crate::utils::{output, progress};

use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 执行 grains 命令
pub fn execute(args: GrainsArgs) -> Result<()> {
    match args.command {
        GrainsCommands::Clean(args) => execute_clean(args),
        GrainsCommands::Merge(args) => execute_merge(args),
        GrainsCommands::Compare(args) => execute_compare(args),
        GrainsCommands::SharedPeaks(args) => execute_shared_peaks(args),
        GrainsCommands::Euler(args) => execute_euler(args),
        GrainsCommands::CheckEuler(args) => execute_check_euler(args),
        GrainsCommands::Info(args) => execute_info(args),
    }
}

fn bogus_policy(skip_bogus: bool) -> BogusGrainPolicy {
    if skip_bogus {
        BogusGrainPolicy::Skip
    } else {
        BogusGrainPolicy::Abort
    }
}

// ─────────────────────────────────────────────────────────────
// clean
// ─────────────────────────────────────────────────────────────

enum CleanStatus {
    Cleaned(usize),
    Skipped,
}

fn execute_clean(args: CleanArgs) -> Result<()> {
    output::print_header("Cleaning GrainSpotter logs");

    let collector = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive);

    if collector.is_single_file() {
        match clean_file(&args.input, &args.output, args.overwrite)? {
            CleanStatus::Cleaned(kept) => {
                output::print_info(&format!("{} grains kept", kept));
                output::print_saved("Cleaned log", &args.output);
            }
            CleanStatus::Skipped => output::print_skip(&format!(
                "{} exists (use --overwrite)",
                args.output.display()
            )),
        }
        return Ok(());
    }

    // 目录模式下 --output 作为文件名后缀
    let suffix = args
        .output
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            GrainkitError::InvalidArgument(format!(
                "invalid output suffix: {}",
                args.output.display()
            ))
        })?
        .to_string();

    // 跳过之前生成的 `<stem>-<suffix>` 文件
    let files = collector
        .excluding_suffix(&format!("-{}", suffix))
        .collect()?;

    if files.is_empty() {
        output::print_warning(&format!(
            "No files matched '{}' under {}",
            args.pattern,
            args.input.display()
        ));
        return Ok(());
    }

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Found {} logs, using {} threads",
        files.len(),
        runner.jobs()
    ));

    let result = runner.run(&files, "Cleaning", |file| {
        let out = batch_output_path(file, &suffix);
        match clean_file(file, &out, args.overwrite) {
            Ok(CleanStatus::Cleaned(kept)) => {
                ProcessResult::Success(format!("{}: {} grains", out.display(), kept))
            }
            Ok(CleanStatus::Skipped) => {
                ProcessResult::Skipped(format!("{} exists, skipped", out.display()))
            }
            Err(e) => ProcessResult::Failed(file.display().to_string(), e.to_string()),
        }
    })?;

    for msg in &result.messages {
        output::print_info(msg);
    }
    for (path, err) in &result.failures {
        output::print_error(&format!("{}: {}", path, err));
    }

    output::print_done(&format!(
        "Cleaned {} of {} logs ({} skipped, {} failed)",
        result.success,
        result.total(),
        result.skipped,
        result.failed
    ));
    Ok(())
}

/// 读取日志（跳过空晶粒）并重新编号写出
fn clean_file(input: &Path, output: &Path, overwrite: bool) -> Result<CleanStatus> {
    if output.exists() && !overwrite {
        return Ok(CleanStatus::Skipped);
    }
    let grains = parse_grainspotter_file(input, BogusGrainPolicy::Skip)?;
    save_grainspotter(output, &grains)?;
    Ok(CleanStatus::Cleaned(grains.len()))
}

/// `dir/run1.log` + `clean.log` -> `dir/run1-clean.log`
fn batch_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    input.with_file_name(format!("{}-{}", stem, suffix))
}

// ─────────────────────────────────────────────────────────────
// merge
// ─────────────────────────────────────────────────────────────

fn execute_merge(args: MergeArgs) -> Result<()> {
    let system: CrystalSystem = args.crystal_system.into();
    let policy = bogus_policy(args.skip_bogus);
    let stem = &args.output_stem;

    let mut report = ReportLog::create(Path::new(&format!("{}-log.dat", stem)))?;
    report.line(&format!(
        "Merging grains from {} GrainSpotter logs",
        args.files.len()
    ))?;
    report.line(&format!(
        "Crystal system: {} ({} symmetry operations)",
        system,
        system.order()
    ))?;
    report.line(&format!(
        "Grains are identical below {:.2}° of misorientation",
        args.misorientation
    ))?;
    report.blank()?;

    let mut lists = Vec::with_capacity(args.files.len());
    for file in &args.files {
        let grains = parse_grainspotter_file(file, policy)?;
        report.line(&format!("Parsed {}: {} grains", file.display(), grains.len()))?;
        lists.push(grains);
    }

    let spinner = progress::create_spinner("Looking for duplicate grains");
    let merged = merge_grains(lists, system, args.misorientation);
    spinner.finish_and_clear();

    report.blank()?;
    report.line(&format!("Total number of grains: {}", merged.total))?;
    report.line(&format!(
        "Pairs of identical grains: {}",
        merged.dedup.pairs.len()
    ))?;
    report.line(&format!("Grains removed: {}", merged.dedup.removed))?;
    report.line(&format!(
        "Number of unique grains: {}",
        merged.unique_grains().len()
    ))?;
    report.blank()?;

    let multiplicities = merged.multiplicities();
    for (times, count) in &multiplicities {
        report.line(&format!("- {} grains indexed {} times", count, times))?;
    }
    report.blank()?;

    let all_path = PathBuf::from(format!("{}-grains.log", stem));
    save_grainspotter(&all_path, merged.unique_grains())?;
    report.line(&format!("Saved unique grains in {}", all_path.display()))?;

    for (times, _) in &multiplicities {
        let path = PathBuf::from(format!("{}-grains-{}.log", stem, times));
        save_grainspotter(&path, &merged.grains_indexed(*times))?;
        report.line(&format!(
            "Saved grains indexed {} times in {}",
            times,
            path.display()
        ))?;
    }

    let log_path = report.path().to_path_buf();
    report.finish()?;
    output::print_saved("Merge log", &log_path);
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// compare
// ─────────────────────────────────────────────────────────────

fn execute_compare(args: CompareArgs) -> Result<()> {
    let system: CrystalSystem = args.crystal_system.into();
    let stem = &args.output_stem;

    let reference = parsers::parse_grains(&args.file1, BogusGrainPolicy::Abort)?;
    let test = parsers::parse_grains(&args.file2, BogusGrainPolicy::Abort)?;
    let (name1, name2) = (source_name(&args.file1), source_name(&args.file2));

    let spinner = progress::create_spinner("Comparing grains");
    let comparison = compare_grains(
        &name1,
        &reference,
        &name2,
        &test,
        system,
        args.misorientation,
    );
    spinner.finish_and_clear();
    let comparison = comparison?;

    let mut report = ReportLog::create(Path::new(&format!("{}-log.dat", stem)))?;
    report.line(&format!("Comparing grains of {} with {}", name2, name1))?;
    report.line(&format!(
        "Crystal system: {} ({} symmetry operations)",
        system,
        system.order()
    ))?;
    report.line(&format!(
        "Grains are identical below {:.2}° of misorientation",
        args.misorientation
    ))?;
    report.blank()?;
    report.lines(&comparison.match_lines())?;
    report.blank()?;
    report.lines(&comparison.summary_lines())?;

    let mut outputs = vec![
        ("matching-grains", comparison.matching_text()),
        ("erroneous-grains", comparison.erroneous_text()),
        ("missing-grains", comparison.missing_text()),
    ];
    if args.verbose {
        outputs.push(("verbose", comparison.verbose_text()));
    }

    report.blank()?;
    for (kind, text) in &outputs {
        let path = PathBuf::from(format!("{}-{}.dat", stem, kind));
        write_file(&path, text)?;
        report.line(&format!("Saved {} in {}", kind.replace('-', " "), path.display()))?;
    }

    let log_path = report.path().to_path_buf();
    report.finish()?;
    output::print_saved("Comparison log", &log_path);
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// shared-peaks
// ─────────────────────────────────────────────────────────────

fn execute_shared_peaks(args: SharedPeaksArgs) -> Result<()> {
    let log_path = write_shared_peaks(
        &args.file1,
        &args.file2,
        args.crystal_system.into(),
        args.misorientation,
        &args.output_stem,
    )?;
    output::print_saved("Shared peaks log", &log_path);
    Ok(())
}

/// 写 `<stem>-log.dat`，返回其路径
fn write_shared_peaks(
    file1: &Path,
    file2: &Path,
    system: CrystalSystem,
    cutoff: f64,
    stem: &str,
) -> Result<PathBuf> {
    let grains1 = parse_grainspotter_file(file1, BogusGrainPolicy::Abort)?;
    let grains2 = parse_grainspotter_file(file2, BogusGrainPolicy::Abort)?;
    let (name1, name2) = (source_name(file1), source_name(file2));

    let mut report = ReportLog::create(Path::new(&format!("{}-log.dat", stem)))?;
    report.line(&format!("Parsed {}, found {} grains", name1, grains1.len()))?;
    report.line(&format!("Parsed {}, found {} grains", name2, grains2.len()))?;
    report.line(&format!(
        "Grains are identical below {:.2}° of misorientation",
        cutoff
    ))?;
    report.blank()?;

    let shared = shared_peaks(&name1, &grains1, &name2, &grains2, system, cutoff);
    report.lines(&shared.first.dedup_lines())?;
    report.blank()?;
    report.lines(&shared.second.dedup_lines())?;
    report.blank()?;
    report.lines(&shared.overlap_lines())?;
    report.blank()?;
    report.line("Peaks information")?;
    report.blank()?;
    report.lines(&shared.peak_lines())?;

    let ambiguous = shared.ambiguous_peaks();
    if ambiguous > 0 {
        report.blank()?;
        report.line(&format!(
            "{} peaks are assigned to more than two grains",
            ambiguous
        ))?;
    }

    let log_path = report.path().to_path_buf();
    report.finish()?;
    Ok(log_path)
}

// ─────────────────────────────────────────────────────────────
// euler
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EulerRecord {
    grain: String,
    phi1: f64,
    #[serde(rename = "Phi")]
    phi: f64,
    phi2: f64,
    npeaks: usize,
}

fn execute_euler(args: EulerArgs) -> Result<()> {
    let grains = parsers::parse_grains(&args.input, BogusGrainPolicy::Abort)?;
    output::print_info(&format!(
        "Parsed {} grains from {}",
        grains.len(),
        args.input.display()
    ));

    match args.format {
        EulerFormat::Txt => write_file(&args.output, &euler_text(&grains))?,
        EulerFormat::Csv => write_euler_csv(&args.output, &grains)?,
    }
    output::print_saved("Euler angles", &args.output);
    Ok(())
}

/// MTEX 格式：每行 `phi1 Phi phi2`
fn euler_text(grains: &[Grain]) -> String {
    grains
        .iter()
        .map(|g| {
            let e = g.euler_angles();
            format!("{:.2} {:.2} {:.2}\n", e.phi1, e.phi, e.phi2)
        })
        .collect()
}

fn write_euler_csv(path: &Path, grains: &[Grain]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for g in grains {
        let e = g.euler_angles();
        writer.serialize(EulerRecord {
            grain: g.name(),
            phi1: e.phi1,
            phi: e.phi,
            phi2: e.phi2,
            npeaks: g.npeaks(),
        })?;
    }
    writer.flush().map_err(|e| GrainkitError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

// ─────────────────────────────────────────────────────────────
// check-euler
// ─────────────────────────────────────────────────────────────

fn execute_check_euler(args: CheckEulerArgs) -> Result<()> {
    let grains = parsers::parse_grains(&args.input, BogusGrainPolicy::Abort)?;
    let mismatches = check_euler_angles(&grains)?;

    if mismatches.is_empty() {
        output::print_success(&format!(
            "Euler angles of all {} grains are consistent with U",
            grains.len()
        ));
        return Ok(());
    }

    output::print_warning(&format!(
        "{} of {} grains have Euler angles inconsistent with U",
        mismatches.len(),
        grains.len()
    ));
    for m in &mismatches {
        println!("{}: U . inverse(U(Euler)) =", m.grain);
        println!("{}", format_matrix(&m.matrix));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// info
// ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct GrainRow {
    #[tabled(rename = "Grain")]
    name: String,
    #[tabled(rename = "Peaks")]
    npeaks: usize,
    #[tabled(rename = "φ1 (°)")]
    phi1: String,
    #[tabled(rename = "Φ (°)")]
    phi: String,
    #[tabled(rename = "φ2 (°)")]
    phi2: String,
    #[tabled(rename = "2θ range (°)")]
    tth_range: String,
}

impl From<&Grain> for GrainRow {
    fn from(g: &Grain) -> Self {
        let e = g.euler_angles();
        let tth_range = match (g.min_two_theta(), g.max_two_theta()) {
            (Some(lo), Some(hi)) => format!("{:.2} - {:.2}", lo, hi),
            _ => "-".to_string(),
        };
        GrainRow {
            name: g.name(),
            npeaks: g.npeaks(),
            phi1: format!("{:.2}", e.phi1),
            phi: format!("{:.2}", e.phi),
            phi2: format!("{:.2}", e.phi2),
            tth_range,
        }
    }
}

fn execute_info(args: InfoArgs) -> Result<()> {
    let grains = parsers::parse_grains(&args.input, bogus_policy(args.skip_bogus))?;
    output::print_header(&format!("Grains in {}", args.input.display()));

    if grains.is_empty() {
        output::print_warning("No grains found");
        return Ok(());
    }

    let rows: Vec<GrainRow> = grains.iter().map(GrainRow::from).collect();
    println!("{}", Table::new(&rows));

    let total: usize = grains.iter().map(|g| g.npeaks()).sum();
    output::print_info(&format!(
        "{} grains, {} assigned peaks ({:.1} per grain)",
        grains.len(),
        total,
        total as f64 / grains.len() as f64
    ));
    Ok(())
}
