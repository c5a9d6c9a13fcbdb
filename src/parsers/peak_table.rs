//! # .flt / .gve 峰表解析器与写出
//!
//! ## FLT 格式
//! ```text
//! # 任意注释
//! #  sc  fc  omega  ...  spot3d_id          <- 最后一行注释给出列名
//! 1023.5 998.2 -12.5 ... 17
//! ```
//!
//! ## GVE 格式
//! ```text
//! 4.1 4.1 4.1 90 90 90 F                    <- 晶胞等头部内容，原样保留
//! ...
//! # ds h k l
//! 0.4082 1 1 1                              <- 预测衍射
//! ...
//! # xr yr zr xc yc ds eta omega spot3d_id xl yl zl
//! 0.1 0.2 0.3 1000 1000 0.51 45.0 -10.0 17 1.0 2.0 3.0
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/peaks.rs`, `commands/stats.rs` 使用
//! - 使用 `models/peak_table.rs`

use crate::error::{GrainkitError, Result};
use crate::models::peak_table::ID_COLUMN;
use crate::models::{PeakRow, PeakTable, PeakTableKind, PredictedReflection};
use crate::parsers::{read_file, source_name, write_file};

use std::collections::HashSet;
use std::path::Path;

/// GVE 数据列所在的表头行（逐词比较）
const GVE_SENTINELS: [&str; 2] = [
    "# xr yr zr xc yc ds eta omega spot3d_id xl yl zl",
    "#  gx  gy  gz  xc  yc  ds  eta  omega  spot3d_id  xl  yl  zl",
];

/// GVE 头部中预测衍射列表的起始行
const PREDICTED_MARKER: &str = "# ds h k l";

fn same_tokens(a: &str, b: &str) -> bool {
    a.split_whitespace().eq(b.split_whitespace())
}

fn is_gve_sentinel(line: &str) -> bool {
    GVE_SENTINELS.iter().any(|s| same_tokens(line, s))
}

/// 去掉列名行开头的 `#`
fn column_names(line: &str) -> Vec<String> {
    line.trim()
        .trim_start_matches('#')
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// 按扩展名确定峰表格式
pub fn peak_table_kind(path: &Path) -> Result<PeakTableKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "flt" => Ok(PeakTableKind::Flt),
        "gve" => Ok(PeakTableKind::Gve),
        _ => Err(GrainkitError::UnsupportedFormat(format!(
            "Cannot determine peak file format for: {} (expected .flt or .gve)",
            path.display()
        ))),
    }
}

/// 按扩展名解析 .flt 或 .gve 文件
pub fn parse_peak_table_file(path: &Path) -> Result<PeakTable> {
    match peak_table_kind(path)? {
        PeakTableKind::Flt => parse_flt_file(path),
        PeakTableKind::Gve => parse_gve_file(path),
    }
}

// ─────────────────────────────────────────────────────────────
// FLT
// ─────────────────────────────────────────────────────────────

/// 解析 .flt 文件
pub fn parse_flt_file(path: &Path) -> Result<PeakTable> {
    let content = read_file(path)?;
    parse_flt_content(&content, &source_name(path))
}

/// 从字符串内容解析 .flt
pub fn parse_flt_content(content: &str, source: &str) -> Result<PeakTable> {
    let lines: Vec<&str> = content.lines().collect();
    let first = lines.iter().take_while(|l| l.trim().is_empty()).count();
    let header_end = first
        + lines[first..]
            .iter()
            .take_while(|l| l.trim_start().starts_with('#'))
            .count();

    if header_end == first {
        return Err(GrainkitError::ParseError {
            format: "flt".to_string(),
            path: source.to_string(),
            reason: "missing '#' column header line".to_string(),
        });
    }

    let header: Vec<String> = lines[first..header_end].iter().map(|l| l.to_string()).collect();
    let columns = column_names(lines[header_end - 1]);

    let data = data_lines(&lines, header_end);
    let rows = parse_rows(PeakTableKind::Flt, source, &columns, header_end, data)?;
    Ok(PeakTable::from_parts(
        PeakTableKind::Flt,
        source,
        header,
        columns,
        rows,
        Vec::new(),
    ))
}

// ─────────────────────────────────────────────────────────────
// GVE
// ─────────────────────────────────────────────────────────────

/// 解析 .gve 文件
pub fn parse_gve_file(path: &Path) -> Result<PeakTable> {
    let content = read_file(path)?;
    parse_gve_content(&content, &source_name(path))
}

/// 从字符串内容解析 .gve
pub fn parse_gve_content(content: &str, source: &str) -> Result<PeakTable> {
    let lines: Vec<&str> = content.lines().collect();
    let sentinel = lines
        .iter()
        .position(|l| is_gve_sentinel(l))
        .ok_or_else(|| GrainkitError::ParseError {
            format: "gve".to_string(),
            path: source.to_string(),
            reason: "missing g-vector column header line".to_string(),
        })?;

    let header: Vec<String> = lines[..=sentinel].iter().map(|l| l.to_string()).collect();
    let columns = column_names(lines[sentinel]);
    let predicted = parse_predicted(&lines[..sentinel], source)?;

    let data = data_lines(&lines, sentinel + 1);

    let rows = parse_rows(PeakTableKind::Gve, source, &columns, sentinel + 1, data)?;
    Ok(PeakTable::from_parts(
        PeakTableKind::Gve,
        source,
        header,
        columns,
        rows,
        predicted,
    ))
}

/// 解析头部中 `# ds h k l` 之后的预测衍射
fn parse_predicted(header: &[&str], source: &str) -> Result<Vec<PredictedReflection>> {
    let Some(start) = header.iter().position(|l| same_tokens(l, PREDICTED_MARKER)) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for (i, line) in header.iter().enumerate().skip(start + 1) {
        let t = line.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        let err = || {
            GrainkitError::line(
                "gve",
                source,
                i + 1,
                format!("cannot read predicted reflection 'ds h k l' from '{}'", t),
            )
        };
        let fields: Vec<&str> = t.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(err());
        }
        let ds: f64 = fields[0].parse().map_err(|_| err())?;
        let mut hkl = [0i32; 3];
        for (slot, s) in hkl.iter_mut().zip(&fields[1..4]) {
            *slot = s.parse().map_err(|_| err())?;
        }
        out.push(PredictedReflection { ds, hkl });
    }
    Ok(out)
}

// ─────────────────────────────────────────────────────────────
// 通用
// ─────────────────────────────────────────────────────────────

/// 从 `start` 开始的数据行（1 起的行号），跳过空行和 `#` 注释行
fn data_lines<'a>(lines: &'a [&'a str], start: usize) -> impl Iterator<Item = (usize, &'a str)> + 'a {
    lines
        .iter()
        .enumerate()
        .skip(start)
        .filter(|(_, l)| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with('#')
        })
        .map(|(i, l)| (i + 1, *l))
}

fn parse_rows<'a>(
    kind: PeakTableKind,
    source: &str,
    columns: &[String],
    header_line: usize,
    data: impl Iterator<Item = (usize, &'a str)>,
) -> Result<Vec<PeakRow>> {
    let format = kind.extension();
    let id_col = columns
        .iter()
        .position(|c| c == ID_COLUMN)
        .ok_or_else(|| {
            GrainkitError::line(
                format,
                source,
                header_line,
                format!("column header has no '{}' column", ID_COLUMN),
            )
        })?;

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for (line_no, line) in data {
        let values: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if values.len() != columns.len() {
            return Err(GrainkitError::line(
                format,
                source,
                line_no,
                format!(
                    "found {} fields, the header declares {} columns",
                    values.len(),
                    columns.len()
                ),
            ));
        }

        let id = parse_id(&values[id_col]).ok_or_else(|| {
            GrainkitError::line(
                format,
                source,
                line_no,
                format!("{} '{}' is not an integer", ID_COLUMN, values[id_col]),
            )
        })?;
        if !seen.insert(id) {
            return Err(GrainkitError::DuplicatePeakId {
                id,
                path: source.to_string(),
                line: line_no,
            });
        }

        rows.push(PeakRow {
            spot3d_id: id,
            values,
        });
    }
    Ok(rows)
}

/// 整数 ID，也接受小数部分为零的浮点写法（如 `17.0`）
fn parse_id(s: &str) -> Option<i64> {
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f: f64 = s.parse().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// 将峰表序列化为文本：头部原样输出，之后每行按列顺序以单个空格分隔
pub fn to_peak_table_string(table: &PeakTable) -> String {
    let mut out = String::new();
    for line in table.header() {
        out.push_str(line);
        out.push('\n');
    }
    for row in table.rows() {
        out.push_str(&row.values.join(" "));
        out.push('\n');
    }
    out
}

/// 保存峰表
///
/// 扩展名必须与表的格式一致，避免把 FLT 内容写进 .gve 文件。
pub fn save_peak_table(path: &Path, table: &PeakTable) -> Result<()> {
    let kind = peak_table_kind(path)?;
    if kind != table.kind() {
        return Err(GrainkitError::UnsupportedFormat(format!(
            "Cannot save a {} peak table as {}",
            table.kind(),
            path.display()
        )));
    }
    write_file(path, &to_peak_table_string(table))
}

#[cfg(test)]
pub(crate) const SAMPLE_GVE: &str = "4.2 4.2 4.2 90.0 90.0 90.0 F
0.2989 0.0 0.0
# wavelength = 0.2989
# ds h k l
0.412 1 1 1
0.476 2 0 0
0.673 2 2 0
#  gx  gy  gz  xc  yc  ds  eta  omega  spot3d_id  xl  yl  zl
0.1 0.2 0.3 1000.0 1010.0 0.4121 45.0 -10.0 101 1.0 2.0 3.0
0.1 0.2 0.3 1001.0 1011.0 0.4762 135.0 20.0 102 1.0 2.0 3.0

0.1 0.2 0.3 1002.0 1012.0 0.6729 -60.0 170.0 103 1.0 2.0 3.0
";

#[cfg(test)]
pub(crate) const SAMPLE_FLT: &str = "#  sc  fc  omega  Number_of_pixels  spot3d_id
1023.5 998.2 -12.5 40 11
1100.0 900.0 -10.0 25 12
1200.0 800.0 15.0 30 13
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gve() {
        let table = parse_gve_content(SAMPLE_GVE, "a.gve").unwrap();
        assert_eq!(table.kind(), PeakTableKind::Gve);
        assert_eq!(table.ids(), vec![101, 102, 103]);
        assert_eq!(table.header().len(), 8);
        assert_eq!(table.column_index("spot3d_id"), Some(8));
        assert_eq!(table.lookup(102).unwrap().values[6], "135.0");
        assert!(matches!(
            table.lookup(999),
            Err(GrainkitError::PeakNotFound { id: 999, .. })
        ));

        let predicted = table.predicted_reflections();
        assert_eq!(predicted.len(), 3);
        assert_eq!(predicted[1].hkl, [2, 0, 0]);
        assert!((predicted[2].ds - 0.673).abs() < 1e-12);

        let g = table.gvectors().unwrap();
        assert!((g[2].eta + 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_gve_round_trip() {
        let table = parse_gve_content(SAMPLE_GVE, "a.gve").unwrap();
        let text = to_peak_table_string(&table);
        let again = parse_gve_content(&text, "b.gve").unwrap();
        assert_eq!(again.ids(), table.ids());
        assert_eq!(again.rows(), table.rows());
        assert_eq!(again.header(), table.header());
    }

    #[test]
    fn test_gve_missing_sentinel() {
        let content = "# ds h k l\n0.41 1 1 1\n0.1 0.2 0.3 1 2 0.4 4 5 6 7 8 9\n";
        let err = parse_gve_content(content, "a.gve").unwrap_err();
        assert!(err.to_string().contains("column header"));
    }

    #[test]
    fn test_parse_flt() {
        let table = parse_flt_content(SAMPLE_FLT, "a.flt").unwrap();
        assert_eq!(table.ids(), vec![11, 12, 13]);
        assert_eq!(table.column_index("Number_of_pixels"), Some(3));
        assert!((table.value_f64(12, "omega").unwrap() + 10.0).abs() < 1e-12);
        assert!((table.value_f64(13, "fc").unwrap() - 800.0).abs() < 1e-12);
    }

    #[test]
    fn test_flt_round_trip_after_removal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.flt");

        let mut table = parse_flt_content(SAMPLE_FLT, "a.flt").unwrap();
        table.remove_ids(&[12]).unwrap();
        save_peak_table(&path, &table).unwrap();

        let back = parse_peak_table_file(&path).unwrap();
        assert_eq!(back.kind(), PeakTableKind::Flt);
        assert_eq!(back.ids(), vec![11, 13]);
        assert_eq!(back.rows()[1].values, vec!["1200.0", "800.0", "15.0", "30", "13"]);
    }

    #[test]
    fn test_flt_field_count_mismatch() {
        let content = "#  sc  fc  spot3d_id\n1.0 2.0 3\n1.0 2.0\n";
        let err = parse_flt_content(content, "a.flt").unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_missing_id_column() {
        let content = "#  sc  fc  omega\n1.0 2.0 3.0\n";
        let err = parse_flt_content(content, "a.flt").unwrap_err();
        assert!(err.to_string().contains("spot3d_id"));
    }

    #[test]
    fn test_duplicate_and_float_ids() {
        let content = "#  sc  spot3d_id\n1.0 5.0\n2.0 6\n3.0 5\n";
        match parse_flt_content(content, "a.flt") {
            Err(GrainkitError::DuplicatePeakId { id, line, .. }) => {
                assert_eq!((id, line), (5, 4));
            }
            other => panic!("unexpected result: {:?}", other.map(|t| t.ids())),
        }

        let content = "#  sc  spot3d_id\n1.0 5.5\n";
        assert!(parse_flt_content(content, "a.flt").is_err());
    }

    #[test]
    fn test_flt_leading_blank_lines_and_comments() {
        let content = format!("\n  \n{}# a comment between rows\n", SAMPLE_FLT);
        let table = parse_flt_content(&content, "a.flt").unwrap();
        assert_eq!(table.ids(), vec![11, 12, 13]);
        assert_eq!(table.header().len(), 1);
        assert_eq!(table.column_index("spot3d_id"), Some(4));
    }

    #[test]
    fn test_gve_skips_comment_rows() {
        let content = SAMPLE_GVE.replace("\n\n", "\n# skipped\n");
        let table = parse_gve_content(&content, "a.gve").unwrap();
        assert_eq!(table.ids(), vec![101, 102, 103]);
    }

    #[test]
    fn test_peak_table_dispatch_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let gve_path = dir.path().join("peaks.GVE");
        std::fs::write(&gve_path, SAMPLE_GVE).unwrap();
        let gve = parse_peak_table_file(&gve_path).unwrap();
        assert_eq!(gve.kind(), PeakTableKind::Gve);

        let txt = dir.path().join("peaks.txt");
        std::fs::write(&txt, SAMPLE_FLT).unwrap();
        assert!(matches!(
            parse_peak_table_file(&txt),
            Err(GrainkitError::UnsupportedFormat(_))
        ));

        // GVE 表不能写成 .flt
        let err = save_peak_table(&dir.path().join("out.flt"), &gve).unwrap_err();
        assert!(matches!(err, GrainkitError::UnsupportedFormat(_)));
        assert!(!dir.path().join("out.flt").exists());
    }
}
