//! # 已指标化衍射峰数据模型
//!
//! GrainSpotter 日志中每个晶粒下列出的一个衍射峰。
//!
//! ## 依赖关系
//! - 被 `models/grain.rs`, `parsers/grainspotter.rs` 使用
//! - 无外部模块依赖

use serde::Serialize;

/// 已指标化的衍射峰（角度单位：度）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedPeak {
    /// 晶粒内序号
    pub num: usize,

    /// g-vector ID
    pub gvector_id: i64,

    /// 峰 ID，对应 .flt/.gve 中的 spot3d_id
    pub peak_id: i64,

    /// Miller 指数
    pub hkl: [i32; 3],

    /// 预测的 (h, k, l)
    pub hkl_pred: [f64; 3],

    /// (dh, dk, dl)
    pub dhkl: [f64; 3],

    pub tth_measured: f64,
    pub tth_pred: f64,
    pub dtth: f64,

    pub omega_measured: f64,
    pub omega_pred: f64,
    pub domega: f64,

    pub eta_measured: f64,
    pub eta_pred: f64,
    pub deta: f64,

    /// 拟合质量 (internal angle)
    pub ia: f64,
}

impl IndexedPeak {
    /// 由测量 2θ 计算 d* = 2 sin(θ) / λ
    pub fn ds_measured(&self, wavelength: f64) -> f64 {
        2.0 * (self.tth_measured / 2.0).to_radians().sin() / wavelength
    }
}

#[cfg(test)]
pub(crate) fn sample_peak(num: usize, peak_id: i64, tth: f64) -> IndexedPeak {
    IndexedPeak {
        num,
        gvector_id: peak_id + 1000,
        peak_id,
        hkl: [1, 1, 1],
        hkl_pred: [1.0, 1.0, 1.0],
        dhkl: [0.0, 0.0, 0.0],
        tth_measured: tth,
        tth_pred: tth,
        dtth: 0.0,
        omega_measured: 10.0,
        omega_pred: 10.0,
        domega: 0.0,
        eta_measured: 20.0,
        eta_pred: 20.0,
        deta: 0.0,
        ia: 0.01,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ds_measured() {
        let peak = sample_peak(1, 5, 10.0);
        let wavelength = 0.3738;
        let expected = 2.0 * 5.0_f64.to_radians().sin() / wavelength;
        assert!((peak.ds_measured(wavelength) - expected).abs() < 1e-12);
    }
}
