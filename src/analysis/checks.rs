//! # 一致性检查
//!
//! - Euler 角与 U 矩阵是否一致
//! - GrainSpotter 日志中的峰是否与 GVE 文件中的 g-vector 对应
//!
//! ## 依赖关系
//! - 被 `commands/grains.rs`, `commands/peaks.rs` 使用
//! - 使用 `orientation/euler.rs`, `models/`

use crate::error::Result;
use crate::models::{Grain, PeakTable};
use crate::orientation::euler::consistency_matrix;
use crate::orientation::{normalized_angle_180, Matrix3};

/// η、ω 的允许偏差（度）
pub const ANGLE_TOLERANCE: f64 = 0.01;
/// d* 的允许偏差（Å⁻¹）
pub const DS_TOLERANCE: f64 = 0.001;
/// 报告的最大错误数
pub const MAX_REPORTED_ERRORS: usize = 10;

// ─────────────────────────────────────────────────────────────
// Euler 角
// ─────────────────────────────────────────────────────────────

/// Euler 角与 U 不一致的晶粒
#[derive(Debug, Clone)]
pub struct EulerMismatch {
    pub grain: String,
    /// U · inverse(U(euler))
    pub matrix: Matrix3,
}

/// 检查每个晶粒的 Euler 角能否重建其 U 矩阵
pub fn check_euler_angles(grains: &[Grain]) -> Result<Vec<EulerMismatch>> {
    let mut out = Vec::new();
    for grain in grains {
        if grain.euler_consistent()? {
            continue;
        }
        out.push(EulerMismatch {
            grain: grain.name(),
            matrix: consistency_matrix(grain.u(), &grain.euler_angles())?,
        });
    }
    Ok(out)
}

// ─────────────────────────────────────────────────────────────
// 日志 vs GVE
// ─────────────────────────────────────────────────────────────

/// 日志中的峰与 GVE 中 g-vector 的不一致
#[derive(Debug, Clone, PartialEq)]
pub enum PeakIssue {
    /// 峰 ID 不在 GVE 中
    Missing { grain: String, peak_id: i64 },
    /// 角度或 d* 不匹配，值依次为 (eta, omega, ds)
    Mismatch {
        grain: String,
        peak_id: i64,
        expected: [f64; 3],
        found: [f64; 3],
    },
}

/// 检查结果
#[derive(Debug, Clone, Default)]
pub struct GveCheckReport {
    /// 检查过的峰数
    pub checked: usize,
    /// 发现的问题（最多 `MAX_REPORTED_ERRORS + 1` 个，超过后停止）
    pub issues: Vec<PeakIssue>,
    /// 是否因错误过多而提前停止
    pub truncated: bool,
}

impl GveCheckReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

/// 检查日志中的每个峰是否存在于 GVE 中，且 η、ω、d* 一致
///
/// 先检查所有 ID；若有缺失则不再比较角度。
pub fn check_peaks_against_gve(
    grains: &[Grain],
    gve: &PeakTable,
    wavelength: f64,
) -> Result<GveCheckReport> {
    let mut report = GveCheckReport::default();

    for grain in grains {
        for peak in grain.peaks() {
            report.checked += 1;
            if !gve.contains(peak.peak_id) {
                report.issues.push(PeakIssue::Missing {
                    grain: grain.name(),
                    peak_id: peak.peak_id,
                });
                if report.issues.len() > MAX_REPORTED_ERRORS {
                    report.truncated = true;
                    return Ok(report);
                }
            }
        }
    }
    if !report.issues.is_empty() {
        return Ok(report);
    }

    for grain in grains {
        for peak in grain.peaks() {
            let expected = [
                normalized_angle_180(peak.eta_measured),
                normalized_angle_180(peak.omega_measured),
                peak.ds_measured(wavelength),
            ];
            let found = [
                normalized_angle_180(gve.value_f64(peak.peak_id, "eta")?),
                normalized_angle_180(gve.value_f64(peak.peak_id, "omega")?),
                gve.value_f64(peak.peak_id, "ds")?,
            ];

            let bad = (expected[0] - found[0]).abs() > ANGLE_TOLERANCE
                || (expected[1] - found[1]).abs() > ANGLE_TOLERANCE
                || (expected[2] - found[2]).abs() > DS_TOLERANCE;
            if bad {
                report.issues.push(PeakIssue::Mismatch {
                    grain: grain.name(),
                    peak_id: peak.peak_id,
                    expected,
                    found,
                });
                if report.issues.len() > MAX_REPORTED_ERRORS {
                    report.truncated = true;
                    return Ok(report);
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::peak::sample_peak;
    use crate::orientation::euler::u_from_euler;
    use crate::orientation::matrix::IDENTITY;
    use crate::orientation::EulerAngles;
    use crate::parsers::peak_table::{parse_gve_content, SAMPLE_GVE};

    fn grain_for_gve(peaks: Vec<(i64, f64, f64, f64)>) -> Grain {
        let peaks = peaks
            .into_iter()
            .enumerate()
            .map(|(i, (id, tth, eta, omega))| {
                let mut p = sample_peak(i + 1, id, tth);
                p.eta_measured = eta;
                p.omega_measured = omega;
                p
            })
            .collect();
        Grain::new("a.log", 1, IDENTITY, IDENTITY, IDENTITY).with_peaks(peaks)
    }

    #[test]
    fn test_euler_check() {
        let angles = EulerAngles::new(10.0, 20.0, 30.0);
        let good = Grain::new("a.log", 1, u_from_euler(&angles), IDENTITY, IDENTITY)
            .with_euler_angles(angles);
        let bad = Grain::new("a.log", 2, u_from_euler(&angles), IDENTITY, IDENTITY)
            .with_euler_angles(EulerAngles::new(190.0, 20.0, 30.0));

        let mismatches = check_euler_angles(&[good, bad]).unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].grain, "Grain-2");
    }

    #[test]
    fn test_gve_check_consistent() {
        let wl = 0.2989;
        let gve = parse_gve_content(SAMPLE_GVE, "a.gve").unwrap();
        let tth = crate::models::gs_input::ds_to_tth(0.4762, wl);
        // η = 135° 与 GVE 相同；ω = 380° 归一化后为 20°
        let grain = grain_for_gve(vec![(102, tth, 135.0, 380.0)]);

        let report = check_peaks_against_gve(&[grain], &gve, wl).unwrap();
        assert_eq!(report.checked, 1);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_gve_check_reports_problems() {
        let wl = 0.2989;
        let gve = parse_gve_content(SAMPLE_GVE, "a.gve").unwrap();
        let tth = crate::models::gs_input::ds_to_tth(0.4121, wl);

        let grain = grain_for_gve(vec![(101, tth, 45.5, -10.0)]);
        let report = check_peaks_against_gve(&[grain], &gve, wl).unwrap();
        assert!(matches!(
            report.issues[0],
            PeakIssue::Mismatch { peak_id: 101, .. }
        ));

        let grain = grain_for_gve(vec![(101, tth, 45.0, -10.0), (999, tth, 0.0, 0.0)]);
        let report = check_peaks_against_gve(&[grain], &gve, wl).unwrap();
        assert_eq!(
            report.issues,
            vec![PeakIssue::Missing {
                grain: "Grain-1".to_string(),
                peak_id: 999
            }]
        );
    }

    #[test]
    fn test_gve_check_truncates() {
        let gve = parse_gve_content(SAMPLE_GVE, "a.gve").unwrap();
        let peaks = (0..20).map(|i| (1000 + i, 8.0, 0.0, 0.0)).collect();
        let report = check_peaks_against_gve(&[grain_for_gve(peaks)], &gve, 0.2989).unwrap();
        assert!(report.truncated);
        assert_eq!(report.issues.len(), MAX_REPORTED_ERRORS + 1);
    }
}
