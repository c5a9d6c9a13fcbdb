//! # GrainSpotter 输入参数
//!
//! `.ini` 中与指标化统计相关的部分：接受范围与角度不确定度。
//!
//! ## 依赖关系
//! - 被 `parsers/gs_input.rs`, `analysis/statistics.rs` 使用
//! - 使用 `orientation/euler.rs`

use crate::orientation::{normalized_angle_180, normalized_angle_360};

/// GrainSpotter 输入参数（角度单位：度）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrainSpotterInput {
    pub tth_ranges: Vec<[f64; 2]>,
    pub eta_ranges: Vec<[f64; 2]>,
    pub omega_ranges: Vec<[f64; 2]>,
    pub sigma_tth: f64,
    pub sigma_eta: f64,
    pub sigma_omega: f64,
    pub nsigmas: f64,
}

impl GrainSpotterInput {
    /// 2θ 容差 σ(2θ) · nsigmas
    pub fn tth_tolerance(&self) -> f64 {
        self.sigma_tth * self.nsigmas
    }

    /// 将 2θ 范围换算为 d* 范围
    pub fn ds_ranges(&self, wavelength: f64) -> Vec<[f64; 2]> {
        self.tth_ranges
            .iter()
            .map(|r| [tth_to_ds(r[0], wavelength), tth_to_ds(r[1], wavelength)])
            .collect()
    }

    /// g-vector 是否落在所有接受窗口内
    ///
    /// η 归一化到 [0, 360)，ω 归一化到 [-180, 180) 后比较。
    pub fn accepts(&self, ds: f64, eta: f64, omega: f64, wavelength: f64) -> bool {
        let eta = normalized_angle_360(eta);
        let omega = normalized_angle_180(omega);

        let in_any = |ranges: &[[f64; 2]], v: f64| ranges.iter().any(|r| v >= r[0] && v <= r[1]);

        in_any(&self.ds_ranges(wavelength), ds)
            && in_any(&self.eta_ranges, eta)
            && in_any(&self.omega_ranges, omega)
    }
}

/// d* = 2 sin(2θ / 2) / λ
pub fn tth_to_ds(tth: f64, wavelength: f64) -> f64 {
    2.0 * (tth / 2.0).to_radians().sin() / wavelength
}

/// 2θ = 2 asin(λ d* / 2)（度）
pub fn ds_to_tth(ds: f64, wavelength: f64) -> f64 {
    2.0 * (wavelength * ds / 2.0).asin().to_degrees()
}
