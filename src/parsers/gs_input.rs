//! # GrainSpotter 输入文件 (.ini) 解析器
//!
//! 只读取指标化统计需要的关键字，其他关键字忽略。
//!
//! ## 格式说明
//! ```text
//! ! 注释
//! tthrange 5.0 9.5
//! etarange 0 360
//! omegarange -28 28
//! uncertainties 0.05 0.5 0.5
//! nsigmas 2
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/stats.rs` 使用
//! - 使用 `models/gs_input.rs`

use crate::error::{GrainkitError, Result};
use crate::models::GrainSpotterInput;
use crate::parsers::{read_file, source_name};

use std::path::Path;

const FORMAT: &str = "GrainSpotter input";

/// 解析 GrainSpotter 输入文件
pub fn parse_gs_input_file(path: &Path) -> Result<GrainSpotterInput> {
    let content = read_file(path)?;
    parse_gs_input_content(&content, &source_name(path))
}

/// 从字符串内容解析 GrainSpotter 输入
pub fn parse_gs_input_content(content: &str, source: &str) -> Result<GrainSpotterInput> {
    let mut input = GrainSpotterInput::default();

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('!') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let keyword = fields[0];
        let numbers = |n: usize| -> Result<Vec<f64>> {
            if fields.len() < n + 1 {
                return Err(GrainkitError::line(
                    FORMAT,
                    source,
                    i + 1,
                    format!("'{}' expects {} values", keyword, n),
                ));
            }
            fields[1..=n]
                .iter()
                .map(|s| {
                    s.parse::<f64>().map_err(|_| {
                        GrainkitError::line(
                            FORMAT,
                            source,
                            i + 1,
                            format!("'{}': non-numeric value '{}'", keyword, s),
                        )
                    })
                })
                .collect()
        };

        match keyword {
            "tthrange" => {
                let v = numbers(2)?;
                input.tth_ranges.push([v[0], v[1]]);
            }
            "etarange" => {
                let v = numbers(2)?;
                input.eta_ranges.push([v[0], v[1]]);
            }
            "omegarange" => {
                let v = numbers(2)?;
                input.omega_ranges.push([v[0], v[1]]);
            }
            "uncertainties" => {
                let v = numbers(3)?;
                input.sigma_tth = v[0];
                input.sigma_eta = v[1];
                input.sigma_omega = v[2];
            }
            "nsigmas" => {
                input.nsigmas = numbers(1)?[0];
            }
            _ => {}
        }
    }

    Ok(input)
}

#[cfg(test)]
pub(crate) const SAMPLE_INI: &str = "! GrainSpotter input
spacegroup 225
tthrange 5.0 9.5
tthrange 10.0 12.0
etarange 0 360
omegarange -28 28

domega 0.5
uncertainties 0.05 0.5 0.6
nsigmas 2
minfracg 0.85
";
