//! # .ubi 取向文件解析器
//!
//! ## 格式说明
//! ```text
//! UBI11 UBI12 UBI13
//! UBI21 UBI22 UBI23
//! UBI31 UBI32 UBI33
//!
//! (下一个晶粒)
//! ```
//! 每 3 行构成一个晶粒的 UBI，晶粒之间可以用空行隔开。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/grain.rs`, `orientation/ubi.rs`

use crate::error::{GrainkitError, Result};
use crate::models::Grain;
use crate::orientation::ubi::{b_from_u_ubi, ubi_to_u};
use crate::parsers::{read_file, source_name};

use std::path::Path;

const FORMAT: &str = "ubi";

/// 解析 .ubi 文件
pub fn parse_ubi_file(path: &Path) -> Result<Vec<Grain>> {
    let content = read_file(path)?;
    parse_ubi_content(&content, &source_name(path))
}

/// 从字符串内容解析 .ubi
pub fn parse_ubi_content(content: &str, source: &str) -> Result<Vec<Grain>> {
    let rows = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| parse_row(l, source, i + 1).map(|r| (i + 1, r)))
        .collect::<Result<Vec<_>>>()?;

    if rows.len() % 3 != 0 {
        return Err(GrainkitError::ParseError {
            format: FORMAT.to_string(),
            path: source.to_string(),
            reason: format!("{} matrix rows is not a multiple of 3", rows.len()),
        });
    }

    let mut grains = Vec::with_capacity(rows.len() / 3);
    for chunk in rows.chunks(3) {
        let ubi = [chunk[0].1, chunk[1].1, chunk[2].1];
        let u = ubi_to_u(&ubi).map_err(|e| {
            GrainkitError::line(FORMAT, source, chunk[0].0, e.to_string())
        })?;
        let b = b_from_u_ubi(&u, &ubi)?;

        let mut grain = Grain::new(source, grains.len() + 1, u, b, ubi);
        grain.set_euler_angles_from_u()?;
        grains.push(grain);
    }

    Ok(grains)
}

fn parse_row(line: &str, source: &str, line_no: usize) -> Result<[f64; 3]> {
    let values = line
        .split_whitespace()
        .map(|s| {
            s.parse::<f64>().map_err(|_| {
                GrainkitError::line(FORMAT, source, line_no, format!("non-numeric value '{}'", s))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    if values.len() != 3 {
        return Err(GrainkitError::line(
            FORMAT,
            source,
            line_no,
            format!("expected 3 values, found {}", values.len()),
        ));
    }
    Ok([values[0], values[1], values[2]])
}
