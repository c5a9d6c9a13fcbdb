//! # 晶粒数据模型
//!
//! 一个被指标化的晶粒：取向矩阵、Euler 角、所属衍射峰及来源信息。
//! 解析完成后不可变，只有 Euler 角可以由 U 重新推导。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `analysis/` 使用
//! - 使用 `models/peak.rs`, `orientation/`

use crate::error::Result;
use crate::models::IndexedPeak;
use crate::orientation::euler::{self, EulerAngles};
use crate::orientation::Matrix3;

/// 晶粒
#[derive(Debug, Clone)]
pub struct Grain {
    file_name: String,
    index_in_file: usize,
    npeaks: usize,
    u: Matrix3,
    b: Matrix3,
    ubi: Matrix3,
    euler: EulerAngles,
    peaks: Vec<IndexedPeak>,
    position: Option<[f64; 3]>,
    source_text: Vec<String>,
}

impl Grain {
    /// 由取向矩阵创建晶粒，Euler 角默认为零，无衍射峰
    pub fn new(
        file_name: impl Into<String>,
        index_in_file: usize,
        u: Matrix3,
        b: Matrix3,
        ubi: Matrix3,
    ) -> Self {
        Grain {
            file_name: file_name.into(),
            index_in_file,
            npeaks: 0,
            u,
            b,
            ubi,
            euler: EulerAngles::default(),
            peaks: Vec::new(),
            position: None,
            source_text: Vec::new(),
        }
    }

    pub fn with_euler_angles(mut self, euler: EulerAngles) -> Self {
        self.euler = euler;
        self
    }

    /// 设置衍射峰列表，峰数随之更新
    pub fn with_peaks(mut self, peaks: Vec<IndexedPeak>) -> Self {
        self.npeaks = peaks.len();
        self.peaks = peaks;
        self
    }

    pub fn with_position(mut self, position: [f64; 3]) -> Self {
        self.position = Some(position);
        self
    }

    /// 保存原始文本块（用于无损回写 GrainSpotter 日志）
    pub fn with_source_text(mut self, lines: Vec<String>) -> Self {
        self.source_text = lines;
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// 文件内序号（从 1 开始）
    pub fn index_in_file(&self) -> usize {
        self.index_in_file
    }

    /// 显示名，如 `Grain-12`
    pub fn name(&self) -> String {
        format!("Grain-{}", self.index_in_file)
    }

    pub fn npeaks(&self) -> usize {
        self.npeaks
    }

    pub fn u(&self) -> &Matrix3 {
        &self.u
    }

    pub fn b(&self) -> &Matrix3 {
        &self.b
    }

    pub fn ubi(&self) -> &Matrix3 {
        &self.ubi
    }

    pub fn euler_angles(&self) -> EulerAngles {
        self.euler
    }

    pub fn peaks(&self) -> &[IndexedPeak] {
        &self.peaks
    }

    pub fn position(&self) -> Option<[f64; 3]> {
        self.position
    }

    pub fn source_text(&self) -> &[String] {
        &self.source_text
    }

    /// 所有峰的 spot3d_id
    pub fn peak_ids(&self) -> Vec<i64> {
        self.peaks.iter().map(|p| p.peak_id).collect()
    }

    /// 所有峰的 g-vector ID
    pub fn gvector_ids(&self) -> Vec<i64> {
        self.peaks.iter().map(|p| p.gvector_id).collect()
    }

    /// 测量 2θ 的最小值
    pub fn min_two_theta(&self) -> Option<f64> {
        self.peaks
            .iter()
            .map(|p| p.tth_measured)
            .reduce(f64::min)
    }

    /// 测量 2θ 的最大值
    pub fn max_two_theta(&self) -> Option<f64> {
        self.peaks
            .iter()
            .map(|p| p.tth_measured)
            .reduce(f64::max)
    }

    /// 由 U 计算 Euler 角（不修改晶粒）
    pub fn euler_angles_from_u(&self) -> Result<EulerAngles> {
        euler::euler_from_u(&self.u)
    }

    /// 用 U 推导的值覆盖 Euler 角
    pub fn set_euler_angles_from_u(&mut self) -> Result<()> {
        self.euler = self.euler_angles_from_u()?;
        Ok(())
    }

    /// 文件中的 Euler 角与 U 是否一致
    pub fn euler_consistent(&self) -> Result<bool> {
        euler::euler_matches_u(&self.u, &self.euler)
    }
}
