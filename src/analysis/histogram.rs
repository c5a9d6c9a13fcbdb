//! # 2θ 直方图
//!
//! 由 GVE 中的 d* 计算 2θ = 2·asin(λ·d*/2)，统计等宽直方图，
//! 输出文本数据（可作为 MAUD 等程序的输入）或图片。
//!
//! ## 依赖关系
//! - 被 `commands/stats.rs` 使用
//! - 使用 `models/peak_table.rs`, `plotters`

use crate::error::{GrainkitError, Result};
use crate::models::gs_input::ds_to_tth;
use crate::models::PeakTable;

use plotters::prelude::*;
use std::fmt::Write;
use std::path::Path;

/// 2θ 直方图
#[derive(Debug, Clone)]
pub struct TthHistogram {
    pub source: String,
    /// 峰总数
    pub npeaks: usize,
    /// 各 bin 的左边界（度）
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    pub bin_width: f64,
}

/// 从峰表计算 2θ 直方图
///
/// 范围为 [min, max]，最后一个 bin 包含最大值。
pub fn tth_histogram(table: &PeakTable, wavelength: f64, nbins: usize) -> Result<TthHistogram> {
    if nbins == 0 {
        return Err(GrainkitError::InvalidArgument(
            "number of bins must be at least 1".into(),
        ));
    }

    let tth: Vec<f64> = table
        .gvectors()?
        .iter()
        .map(|g| ds_to_tth(g.ds, wavelength))
        .collect();

    if let Some(bad) = tth.iter().find(|t| !t.is_finite()) {
        return Err(GrainkitError::InvalidArgument(format!(
            "2theta is not defined ({}) for wavelength {}, check the wavelength",
            bad, wavelength
        )));
    }
    if tth.is_empty() {
        return Err(GrainkitError::ParseError {
            format: table.kind().to_string(),
            path: table.source().to_string(),
            reason: "no peaks to build a histogram from".into(),
        });
    }

    let min = tth.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = tth.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    // 所有峰位相同时退化为宽度 1° 的范围
    let (lo, hi) = if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };
    let width = (hi - lo) / nbins as f64;

    let mut counts = vec![0usize; nbins];
    for t in &tth {
        let bin = (((t - lo) / width) as usize).min(nbins - 1);
        counts[bin] += 1;
    }

    Ok(TthHistogram {
        source: table.source().to_string(),
        npeaks: tth.len(),
        edges: (0..nbins).map(|i| lo + i as f64 * width).collect(),
        counts,
        bin_width: width,
    })
}

impl TthHistogram {
    /// 各 bin 中的峰所占比例
    pub fn fractions(&self) -> Vec<f64> {
        self.counts
            .iter()
            .map(|&c| c as f64 / self.npeaks as f64)
            .collect()
    }

    /// 文本格式：`2θ 比例`，带注释头
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        writeln!(out, "# Histograms of two theta angles in {}", self.source).ok();
        writeln!(out, "# Original number of peaks: {}", self.npeaks).ok();
        writeln!(out, "# Number of bins: {}", self.counts.len()).ok();
        out.push_str("# Two theta (degrees), proportion of peaks in bin\n#\n");
        for (edge, frac) in self.edges.iter().zip(self.fractions()) {
            writeln!(out, "{:.4} {:.4e}", edge, frac).ok();
        }
        out
    }
}

/// 绘制直方图（扩展名为 .svg 时输出 SVG，否则 PNG）
pub fn plot_histogram(hist: &TthHistogram, output_path: &Path, width: u32, height: u32) -> Result<()> {
    let use_svg = output_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);

    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_histogram(&root, hist)?;
        root.present()
            .map_err(|e| GrainkitError::Other(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_histogram(&root, hist)?;
        root.present()
            .map_err(|e| GrainkitError::Other(e.to_string()))?;
    }
    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    hist: &TthHistogram,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| GrainkitError::Other(format!("{:?}", e)))?;

    let fractions = hist.fractions();
    let x_min = hist.edges.first().copied().unwrap_or(0.0);
    let x_max = x_min + hist.bin_width * hist.counts.len() as f64;
    let y_max = fractions.iter().cloned().fold(0.0, f64::max) * 1.1;
    let y_max = if y_max > 0.0 { y_max } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption(
            format!("2θ histogram: {}", hist.source),
            ("sans-serif", 24).into_font(),
        )
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(|e| GrainkitError::Other(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc("2θ (°)")
        .y_desc("Fraction of peaks")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| GrainkitError::Other(format!("{:?}", e)))?;

    let bar_color = RGBColor(0, 102, 204);
    chart
        .draw_series(hist.edges.iter().zip(&fractions).map(|(&x, &y)| {
            Rectangle::new([(x, 0.0), (x + hist.bin_width, y)], bar_color.filled())
        }))
        .map_err(|e| GrainkitError::Other(format!("{:?}", e)))?;

    Ok(())
}
