//! # .gff 晶粒文件解析器
//!
//! ## 格式说明
//! ```text
//! # grain_id phase_id grainsize grainvolume x y z phi1 PHI phi2 U11 ... U33 UBI11 ... UBI33 eps11 ...
//! 1 0 12.5 1953.1 10.2 -3.1 4.4 120.3 45.2 10.8 0.12 ...
//! ```
//! 第一行为表头（丢弃），之后每行一个晶粒。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/grain.rs`, `orientation/ubi.rs`

use crate::error::{GrainkitError, Result};
use crate::models::Grain;
use crate::orientation::ubi::b_from_u_ubi;
use crate::orientation::{EulerAngles, Matrix3};
use crate::parsers::{read_file, source_name};

use std::path::Path;

const FORMAT: &str = "gff";

/// x y z 起始列
const POSITION_COL: usize = 4;
/// phi1 PHI phi2 起始列
const EULER_COL: usize = 7;
/// U11 起始列
const U_COL: usize = 10;
/// UBI11 起始列
const UBI_COL: usize = 19;
/// 至少需要读到 UBI33
const MIN_FIELDS: usize = UBI_COL + 9;

/// 解析 .gff 文件
pub fn parse_gff_file(path: &Path) -> Result<Vec<Grain>> {
    let content = read_file(path)?;
    parse_gff_content(&content, &source_name(path))
}

/// 从字符串内容解析 .gff
pub fn parse_gff_content(content: &str, source: &str) -> Result<Vec<Grain>> {
    let mut grains = Vec::new();

    for (i, line) in content.lines().enumerate().skip(1) {
        let line_no = i + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < MIN_FIELDS {
            return Err(GrainkitError::line(
                FORMAT,
                source,
                line_no,
                format!("expected at least {} columns, found {}", MIN_FIELDS, fields.len()),
            ));
        }

        let values = fields[..MIN_FIELDS]
            .iter()
            .map(|s| {
                s.parse::<f64>().map_err(|_| {
                    GrainkitError::line(FORMAT, source, line_no, format!("non-numeric value '{}'", s))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let u = read_matrix(&values, U_COL);
        let ubi = read_matrix(&values, UBI_COL);
        let b = b_from_u_ubi(&u, &ubi)?;
        let euler = EulerAngles::new(
            values[EULER_COL],
            values[EULER_COL + 1],
            values[EULER_COL + 2],
        );
        let position = [
            values[POSITION_COL],
            values[POSITION_COL + 1],
            values[POSITION_COL + 2],
        ];

        grains.push(
            Grain::new(source, grains.len() + 1, u, b, ubi)
                .with_euler_angles(euler)
                .with_position(position),
        );
    }

    Ok(grains)
}

/// 以行优先顺序从 `start` 列读取 3×3 矩阵
fn read_matrix(values: &[f64], start: usize) -> Matrix3 {
    let mut m = [[0.0; 3]; 3];
    for (k, v) in values[start..start + 9].iter().enumerate() {
        m[k / 3][k % 3] = *v;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::euler::u_from_euler;
    use crate::orientation::matrix::{allclose, inverse, mat_mul};

    fn gff_line(id: usize, euler: [f64; 3]) -> String {
        let u = u_from_euler(&EulerAngles::new(euler[0], euler[1], euler[2]));
        let b = [[0.2, 0.01, 0.0], [0.0, 0.2, 0.0], [0.0, 0.0, 0.2]];
        let ubi = inverse(&mat_mul(&u, &b)).unwrap();

        let mut fields = vec![
            id.to_string(),
            "0".into(),
            "12.5".into(),
            "1953.1".into(),
            "10.5".into(),
            "-3.0".into(),
            "4.25".into(),
        ];
        fields.extend(euler.iter().map(|v| v.to_string()));
        fields.extend(u.iter().flatten().map(|v| format!("{:.12}", v)));
        fields.extend(ubi.iter().flatten().map(|v| format!("{:.12}", v)));
        fields.extend(["0.001", "0", "0", "0.001", "0", "0.001"].iter().map(|s| s.to_string()));
        fields.join(" ")
    }

    #[test]
    fn test_parse_gff() {
        let content = format!(
            "# grain_id phase_id grainsize grainvolume x y z phi1 PHI phi2 U11 U12 U13 U21 U22 U23 U31 U32 U33 UBI11 UBI12 UBI13 UBI21 UBI22 UBI23 UBI31 UBI32 UBI33 eps11 eps12 eps13 eps22 eps23 eps33\n{}\n{}\n",
            gff_line(1, [10.0, 20.0, 30.0]),
            gff_line(2, [200.0, 80.0, 5.0])
        );
        let grains = parse_gff_content(&content, "a.gff").unwrap();
        assert_eq!(grains.len(), 2);

        let g = &grains[1];
        assert_eq!(g.index_in_file(), 2);
        assert_eq!(g.euler_angles(), EulerAngles::new(200.0, 80.0, 5.0));
        assert_eq!(g.position(), Some([10.5, -3.0, 4.25]));
        assert!(g.peaks().is_empty());

        // UBI 第三行取自 UBI31..UBI33
        let b = [[0.2, 0.01, 0.0], [0.0, 0.2, 0.0], [0.0, 0.0, 0.2]];
        assert!(allclose(g.b(), &b, 1e-8, 1e-10));
        assert!(g.euler_consistent().unwrap());
    }

    #[test]
    fn test_short_line() {
        let content = "# header\n1 0 12.5 1953.1 10.5\n";
        let err = parse_gff_content(content, "a.gff").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
