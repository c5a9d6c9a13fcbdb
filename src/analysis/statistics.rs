//! # GrainSpotter 指标化统计
//!
//! 对一个或多个物相，统计实验 g-vector 中有多少落在 GrainSpotter 的
//! 接受窗口内、能归属到某个预测衍射，以及实际被指标化的比例。
//!
//! ## 依赖关系
//! - 被 `commands/stats.rs` 使用
//! - 使用 `models/gs_input.rs`, `models/peak_table.rs`

use crate::error::{GrainkitError, Result};
use crate::models::gs_input::tth_to_ds;
use crate::models::{Grain, GrainSpotterInput, PeakTable};

use tabled::Tabled;

/// 一个物相的输入
#[derive(Debug, Clone)]
pub struct PhaseInput {
    pub log_name: String,
    pub grains: Vec<Grain>,
    pub input: GrainSpotterInput,
    pub gve: PeakTable,
}

/// 单个物相的指标化结果
#[derive(Debug, Clone, Tabled)]
pub struct PhaseSummary {
    #[tabled(rename = "Phase")]
    pub phase: usize,
    #[tabled(rename = "Log file")]
    pub log_name: String,
    #[tabled(rename = "Grains")]
    pub grains: usize,
    #[tabled(rename = "Indexed g-vectors")]
    pub indexed: usize,
    #[tabled(rename = "Per grain", display_with = "display_1f")]
    pub per_grain: f64,
}

fn display_1f(v: &f64) -> String {
    format!("{:.1}", v)
}

/// 预测衍射的 d* 接受窗口
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionWindow {
    pub ds: f64,
    pub hkl: [i32; 3],
    pub tth: f64,
    pub ds_min: f64,
    pub ds_max: f64,
}

/// 全局指标化统计
#[derive(Debug, Clone)]
pub struct IndexingStatistics {
    pub phases: Vec<PhaseSummary>,
    pub windows: Vec<ReflectionWindow>,
    /// 合并后的实验 g-vector 数
    pub gvectors: usize,
    /// 落在 2θ/η/ω 接受窗口内的 g-vector 数
    pub in_range: usize,
    /// 能归属到某个预测衍射的 g-vector 数
    pub assignable: usize,
}

impl IndexingStatistics {
    pub fn total_grains(&self) -> usize {
        self.phases.iter().map(|p| p.grains).sum()
    }

    pub fn total_indexed(&self) -> usize {
        self.phases.iter().map(|p| p.indexed).sum()
    }

    /// 可指标化但未被指标化的 g-vector 数（可能为负）
    pub fn remaining(&self) -> i64 {
        self.assignable as i64 - self.total_indexed() as i64
    }

    /// 被指标化的百分比
    pub fn indexed_percent(&self) -> f64 {
        if self.assignable == 0 {
            0.0
        } else {
            100.0 * self.total_indexed() as f64 / self.assignable as f64
        }
    }
}

/// 预测衍射的 d* 窗口：2θ ± σ(2θ)·nsigmas
pub fn reflection_windows(phase: &PhaseInput, wavelength: f64) -> Vec<ReflectionWindow> {
    let tol = phase.input.tth_tolerance();
    phase
        .gve
        .predicted_reflections()
        .iter()
        .map(|p| {
            let tth = p.two_theta(wavelength);
            ReflectionWindow {
                ds: p.ds,
                hkl: p.hkl,
                tth,
                ds_min: tth_to_ds(tth - tol, wavelength),
                ds_max: tth_to_ds(tth + tol, wavelength),
            }
        })
        .collect()
}

/// 计算多物相指标化统计
pub fn indexing_statistics(phases: &[PhaseInput], wavelength: f64) -> Result<IndexingStatistics> {
    let first = phases
        .first()
        .ok_or_else(|| GrainkitError::InvalidArgument("at least one phase is required".into()))?;
    if wavelength <= 0.0 {
        return Err(GrainkitError::InvalidArgument(format!(
            "wavelength must be positive, got {}",
            wavelength
        )));
    }

    let summaries = phases
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let indexed: usize = p.grains.iter().map(|g| g.npeaks()).sum();
            PhaseSummary {
                phase: i,
                log_name: p.log_name.clone(),
                grains: p.grains.len(),
                indexed,
                per_grain: if p.grains.is_empty() {
                    0.0
                } else {
                    indexed as f64 / p.grains.len() as f64
                },
            }
        })
        .collect();

    let windows: Vec<ReflectionWindow> = phases
        .iter()
        .flat_map(|p| reflection_windows(p, wavelength))
        .collect();

    // 按 spot3d_id 合并所有物相的 g-vector
    let mut merged = first.gve.clone();
    for p in &phases[1..] {
        merged.merge_missing(&p.gve)?;
    }
    let gvectors = merged.gvectors()?;

    let in_range: Vec<f64> = gvectors
        .iter()
        .filter(|g| {
            phases
                .iter()
                .any(|p| p.input.accepts(g.ds, g.eta, g.omega, wavelength))
        })
        .map(|g| g.ds)
        .collect();

    let assignable = in_range
        .iter()
        .filter(|&&ds| windows.iter().any(|w| ds >= w.ds_min && ds <= w.ds_max))
        .count();

    Ok(IndexingStatistics {
        phases: summaries,
        windows,
        gvectors: gvectors.len(),
        in_range: in_range.len(),
        assignable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::comparison::grain_with;
    use crate::parsers::gs_input::{parse_gs_input_content, SAMPLE_INI};
    use crate::parsers::peak_table::{parse_gve_content, SAMPLE_GVE};

    #[test]
    fn test_indexing_statistics() {
        let wavelength = 0.2989;
        let phase = PhaseInput {
            log_name: "a.log".to_string(),
            grains: vec![grain_with(1, [10.0, 20.0, 30.0], 2)],
            input: parse_gs_input_content(SAMPLE_INI, "a.ini").unwrap(),
            gve: parse_gve_content(SAMPLE_GVE, "a.gve").unwrap(),
        };

        let stats = indexing_statistics(&[phase], wavelength).unwrap();
        assert_eq!(stats.gvectors, 3);
        assert_eq!(stats.windows.len(), 3);
        assert_eq!(stats.total_grains(), 1);
        assert_eq!(stats.total_indexed(), 2);

        // 101 (2θ≈7.06°) 和 102 (2θ≈8.16°) 在范围内；
        // 103 的 ω = 170° 不在 [-28, 28]
        assert_eq!(stats.in_range, 2);
        assert_eq!(stats.assignable, 2);
        assert_eq!(stats.remaining(), 0);
        assert!((stats.indexed_percent() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_reflection_window_contains_prediction() {
        let phase = PhaseInput {
            log_name: "a.log".to_string(),
            grains: Vec::new(),
            input: parse_gs_input_content(SAMPLE_INI, "a.ini").unwrap(),
            gve: parse_gve_content(SAMPLE_GVE, "a.gve").unwrap(),
        };
        for w in reflection_windows(&phase, 0.2989) {
            assert!(w.ds_min < w.ds && w.ds < w.ds_max);
        }
    }

    #[test]
    fn test_no_phase() {
        assert!(indexing_statistics(&[], 0.3).is_err());
    }
}
