//! # 两组晶粒的对比
//!
//! 以第一组（参考，如模拟输入）为基准，检查第二组（如 GrainSpotter 结果）
//! 中每个唯一晶粒能否在参考组中找到对应晶粒。
//!
//! ## 输出文件
//! - `<stem>-matching-grains.dat`: 配对成功的晶粒及取向差
//! - `<stem>-erroneous-grains.dat`: 参考组中找不到的晶粒
//! - `<stem>-missing-grains.dat`: 没有被找到的参考晶粒
//! - `<stem>-verbose.dat`: 所有晶粒对的取向差（可选）
//!
//! ## 依赖关系
//! - 被 `commands/grains.rs` 使用
//! - 使用 `analysis/comparison.rs`

use crate::analysis::comparison::{misorientation_table, remove_double_grains, Deduplicated};
use crate::error::{GrainkitError, Result};
use crate::models::Grain;
use crate::orientation::matrix::format_matrix;
use crate::orientation::CrystalSystem;

use std::fmt::Write;

/// 一对匹配的晶粒（下标指向去重后的列表）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainMatch {
    pub reference: usize,
    pub test: usize,
    pub misorientation: f64,
}

/// 对比结果
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub reference_name: String,
    pub test_name: String,
    pub reference_total: usize,
    pub test_total: usize,
    pub reference: Deduplicated,
    pub test: Deduplicated,
    pub matches: Vec<GrainMatch>,
    /// 没有配对的测试晶粒
    pub erroneous: Vec<usize>,
    /// 没有被找到的参考晶粒
    pub missing: Vec<usize>,
    /// misorientations[t][r]: 测试晶粒 t 与参考晶粒 r 的最小取向差
    pub misorientations: Vec<Vec<f64>>,
}

/// 对比两组晶粒
///
/// 两组先各自去重。一个测试晶粒与多个参考晶粒匹配时返回 `AmbiguousMatch`。
pub fn compare_grains(
    reference_name: &str,
    reference: &[Grain],
    test_name: &str,
    test: &[Grain],
    system: CrystalSystem,
    cutoff: f64,
) -> Result<ComparisonReport> {
    let ref_dedup = remove_double_grains(reference, system, cutoff);
    let test_dedup = remove_double_grains(test, system, cutoff);

    let table = misorientation_table(&test_dedup.grains, &ref_dedup.grains, system);

    let mut found = vec![false; ref_dedup.grains.len()];
    let mut matches = Vec::new();
    let mut erroneous = Vec::new();

    for (t, row) in table.iter().enumerate() {
        let hits: Vec<usize> = row
            .iter()
            .enumerate()
            .filter(|(_, &angle)| angle < cutoff)
            .map(|(r, _)| r)
            .collect();

        match hits.as_slice() {
            [] => erroneous.push(t),
            [r] => {
                found[*r] = true;
                matches.push(GrainMatch {
                    reference: *r,
                    test: t,
                    misorientation: row[*r],
                });
            }
            _ => {
                return Err(GrainkitError::AmbiguousMatch {
                    grain: test_dedup.grains[t].name(),
                    path: test_name.to_string(),
                    reference: reference_name.to_string(),
                    count: hits.len(),
                })
            }
        }
    }

    let missing = found
        .iter()
        .enumerate()
        .filter(|(_, &f)| !f)
        .map(|(r, _)| r)
        .collect();

    Ok(ComparisonReport {
        reference_name: reference_name.to_string(),
        test_name: test_name.to_string(),
        reference_total: reference.len(),
        test_total: test.len(),
        reference: ref_dedup,
        test: test_dedup,
        matches,
        erroneous,
        missing,
        misorientations: table,
    })
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

impl ComparisonReport {
    /// 参考晶粒被找到的百分比
    pub fn indexed_percent(&self) -> f64 {
        percent(self.matches.len(), self.reference.grains.len())
    }

    /// 测试晶粒中错误晶粒的百分比
    pub fn erroneous_percent(&self) -> f64 {
        percent(self.erroneous.len(), self.test.grains.len())
    }

    fn ref_grain(&self, r: usize) -> &Grain {
        &self.reference.grains[r]
    }

    fn test_grain(&self, t: usize) -> &Grain {
        &self.test.grains[t]
    }

    fn pair_text(&self, out: &mut String, r: usize, t: usize, verb: &str) {
        let g1 = self.ref_grain(r);
        let g2 = self.test_grain(t);
        writeln!(out, "Grain {} of {}", g1.name(), self.reference_name).ok();
        writeln!(out, "\t{} grain {} of {}", verb, g2.name(), self.test_name).ok();
        writeln!(out, "\tmisorientation: {:.2}°", self.misorientations[t][r]).ok();
        writeln!(out, "U grain 1: \n{}", format_matrix(g1.u())).ok();
        writeln!(out, "U grain 2: \n{}", format_matrix(g2.u())).ok();
        out.push_str("\n\n");
    }

    /// 报告中每个匹配晶粒的一行说明
    pub fn match_lines(&self) -> Vec<String> {
        self.matches
            .iter()
            .map(|m| {
                format!(
                    "- Grain {} of {} matches {} of {} with a misorientation of {:.2}°",
                    self.ref_grain(m.reference).name(),
                    self.reference_name,
                    self.test_grain(m.test).name(),
                    self.test_name,
                    m.misorientation
                )
            })
            .collect()
    }

    /// `-matching-grains.dat` 内容
    pub fn matching_text(&self) -> String {
        let mut out = String::new();
        for m in &self.matches {
            self.pair_text(&mut out, m.reference, m.test, "matches");
        }
        out
    }

    /// `-erroneous-grains.dat` 内容
    pub fn erroneous_text(&self) -> String {
        let mut out = String::new();
        for &t in &self.erroneous {
            writeln!(
                out,
                "\nGrain {} of {}: no match",
                self.test_grain(t).name(),
                self.test_name
            ).ok();
            for (r, g1) in self.reference.grains.iter().enumerate() {
                writeln!(
                    out,
                    "- Min angle with grain {}: {:.2}°",
                    g1.name(),
                    self.misorientations[t][r]
                ).ok();
            }
        }
        out
    }

    /// `-missing-grains.dat` 内容
    pub fn missing_text(&self) -> String {
        self.missing
            .iter()
            .map(|&r| {
                format!(
                    "Grain {} of {} has no match\n",
                    self.ref_grain(r).name(),
                    self.reference_name
                )
            })
            .collect()
    }

    /// `-verbose.dat` 内容：所有晶粒对
    pub fn verbose_text(&self) -> String {
        let mut out = String::new();
        for t in 0..self.test.grains.len() {
            for r in 0..self.reference.grains.len() {
                self.pair_text(&mut out, r, t, "compared with");
            }
        }
        out
    }

    /// 汇总统计行
    pub fn summary_lines(&self) -> Vec<String> {
        let (f1, f2) = (&self.reference_name, &self.test_name);
        vec![
            format!("N. of grains in {}: {}", f1, self.reference_total),
            format!("N. of unique grains in {}: {}", f1, self.reference.grains.len()),
            format!("N. of grains in {}: {}", f2, self.test_total),
            format!("N. of unique grains in {}: {}", f2, self.test.grains.len()),
            format!(
                "N. of unique grains found in both {} and {}: {}",
                f1,
                f2,
                self.matches.len()
            ),
            format!(
                "N. of unique grains found only in {}: {}",
                f2,
                self.erroneous.len()
            ),
            format!(
                "N. of unique grains found in {} but not in {}: {}",
                f1,
                f2,
                self.missing.len()
            ),
            String::new(),
            "Indexing capability".to_string(),
            format!("- {:.1} pc of {} grains indexed", self.indexed_percent(), f1),
            format!(
                "- {:.1} pc of {} grains not indexed",
                100.0 - self.indexed_percent(),
                f1
            ),
            format!(
                "- {:.1} pc of erroneous grains in {}",
                self.erroneous_percent(),
                f2
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::comparison::grain_with;

    fn reference() -> Vec<Grain> {
        vec![
            grain_with(1, [10.0, 20.0, 30.0], 5),
            grain_with(2, [80.0, 40.0, 10.0], 5),
            grain_with(3, [150.0, 70.0, 200.0], 5),
        ]
    }

    #[test]
    fn test_compare_grains() {
        let test = vec![
            grain_with(1, [80.5, 40.0, 10.0], 6),
            grain_with(2, [300.0, 10.0, 50.0], 6),
            grain_with(3, [10.2, 20.0, 30.0], 6),
        ];
        let report = compare_grains(
            "sim.gff",
            &reference(),
            "gs.log",
            &test,
            CrystalSystem::Triclinic,
            2.0,
        )
        .unwrap();

        assert_eq!(report.matches.len(), 2);
        assert_eq!(report.matches[0].reference, 1);
        assert_eq!(report.matches[0].test, 0);
        assert!((report.matches[0].misorientation - 0.5).abs() < 1e-6);
        assert_eq!(report.erroneous, vec![1]);
        assert_eq!(report.missing, vec![2]);
        assert!((report.indexed_percent() - 200.0 / 3.0).abs() < 1e-9);
        assert!((report.erroneous_percent() - 100.0 / 3.0).abs() < 1e-9);

        assert!(report.match_lines()[0].contains("Grain-2 of sim.gff matches Grain-1 of gs.log"));
        assert!(report.erroneous_text().contains("Grain Grain-2 of gs.log: no match"));
        assert_eq!(report.missing_text(), "Grain Grain-3 of sim.gff has no match\n");
        assert_eq!(report.matching_text().matches("misorientation").count(), 2);
        assert_eq!(report.verbose_text().matches("compared with").count(), 9);
    }

    #[test]
    fn test_ambiguous_match_is_error() {
        // 两个参考晶粒相距 3°，测试晶粒位于中间
        let reference = vec![
            grain_with(1, [10.0, 20.0, 30.0], 5),
            grain_with(2, [13.0, 20.0, 30.0], 5),
        ];
        let test = vec![grain_with(1, [11.5, 20.0, 30.0], 5)];
        let err = compare_grains("a.gff", &reference, "b.log", &test, CrystalSystem::Triclinic, 2.0)
            .unwrap_err();
        assert!(matches!(err, GrainkitError::AmbiguousMatch { count: 2, .. }));
    }
}
