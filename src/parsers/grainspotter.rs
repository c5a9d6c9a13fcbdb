//! # GrainSpotter 日志解析器
//!
//! 解析 GrainSpotter 输出的 `.log` 文件，并可将晶粒重新写回同样的格式。
//!
//! ## 格式说明
//! ```text
//! Found 2 grains
//! Syntax:
//! Grain nr                                  <- 文件头，第一次出现 "Grain"
//! ...
//! Grain 1, 34 ...                           <- 晶粒序号, 峰数
//! 40 34 34 0                                <- 统计行
//! 0.0123 10.2 -3.4 5.6 0.02                 <- mean_IA x y z chisq
//! U11 U12 U13                               <- U (3 行)
//! ...
//! UBI11 UBI12 UBI13                         <- UBI (3 行)
//! ...
//! r1 r2 r3                                  <- Rodrigues 向量
//! phi1 PHI phi2                             <- Euler 角
//! q0 qx qy qz                               <- 四元数
//! 1 102 1340 1 1 1 ...                      <- 峰列表 (22 列，共 npeaks 行)
//! ```
//! 行之间的空行被跳过。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 和 `commands/` 使用
//! - 使用 `models/grain.rs`, `models/peak.rs`, `orientation/ubi.rs`

use crate::error::{GrainkitError, Result};
use crate::models::{Grain, IndexedPeak};
use crate::orientation::ubi::b_from_u_ubi;
use crate::orientation::{EulerAngles, Matrix3};
use crate::parsers::{read_file, source_name, write_file, BogusGrainPolicy};

use regex::Regex;
use std::path::Path;

const FORMAT: &str = "GrainSpotter log";

/// 晶粒标记
const GRAIN_MARKER: &str = "Grain";

/// 峰行的列数
const PEAK_FIELDS: usize = 22;

/// 写回文件时使用的文件头
const LOG_PREAMBLE: &str = "Syntax:
Grain nr
#expected gvectors #measured gvectors #measured once #measured more than once
mean_IA position_x position_y position_z pos_chisq
U11 U12 U13
U21 U22 U23
U31 U32 U33

UBI11 UBI12 UBI13
UBI21 UBI22 UBI23
UBI31 UBI32 UBI33

r1 r2 r3

phi1 phi phi2

q0 qx qy qz

#  gvector_id peak_id  h k l  h_pred k_pred l_pred  dh dk dl  tth_meas tth_pred dtth  omega_meas omega_pred domega  eta_meas  eta_pred deta  IA
.
.
";

fn header_regex() -> Regex {
    Regex::new(r"^\s*Grain\s+(\d+)\s*,\s*(-?\d+)(.*)$").unwrap()
}

/// 解析 GrainSpotter 日志文件
pub fn parse_grainspotter_file(path: &Path, policy: BogusGrainPolicy) -> Result<Vec<Grain>> {
    let content = read_file(path)?;
    parse_grainspotter_content(&content, &source_name(path), policy)
}

/// 从字符串内容解析 GrainSpotter 日志
pub fn parse_grainspotter_content(
    content: &str,
    source: &str,
    policy: BogusGrainPolicy,
) -> Result<Vec<Grain>> {
    let mut parser = LogParser::new(source, policy);
    for (i, line) in content.lines().enumerate() {
        parser.feed(i + 1, line)?;
    }
    parser.finish()
}

// ─────────────────────────────────────────────────────────────
// 行状态机
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingGrain,
    ReadingHeader,
    ReadingPosition,
    ReadingU(usize),
    ReadingUbi(usize),
    ReadingRodrigues,
    ReadingEuler,
    ReadingQuaternion,
    ReadingPeaks,
}

/// 正在读取的晶粒块
struct PartialGrain {
    index: usize,
    npeaks: usize,
    position: Option<[f64; 3]>,
    u: Matrix3,
    ubi: Matrix3,
    euler: EulerAngles,
    peaks: Vec<IndexedPeak>,
    text: Vec<String>,
}

struct LogParser<'a> {
    source: &'a str,
    policy: BogusGrainPolicy,
    header_re: Regex,
    state: State,
    seen_preamble: bool,
    /// 文件首行 `Found N grains` 中的 N
    announced: Option<usize>,
    /// 已遇到的晶粒块数（含被跳过的空晶粒）
    blocks: usize,
    current: Option<PartialGrain>,
    grains: Vec<Grain>,
}

impl<'a> LogParser<'a> {
    fn new(source: &'a str, policy: BogusGrainPolicy) -> Self {
        LogParser {
            source,
            policy,
            header_re: header_regex(),
            state: State::SeekingGrain,
            seen_preamble: false,
            announced: None,
            blocks: 0,
            current: None,
            grains: Vec::new(),
        }
    }

    fn error(&self, line_no: usize, reason: impl Into<String>) -> GrainkitError {
        GrainkitError::line(FORMAT, self.source, line_no, reason)
    }

    fn feed(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let line = raw.trim();
        let is_marker = line.contains(GRAIN_MARKER);

        if !self.seen_preamble && self.announced.is_none() {
            self.announced = announced_grains(line);
        }

        // 第一次出现的 "Grain" 属于文件头
        if is_marker && !self.seen_preamble {
            self.seen_preamble = true;
            return Ok(());
        }

        if self.state == State::SeekingGrain {
            if is_marker {
                self.open_block(line_no, line)?;
            }
            return Ok(());
        }

        let source = self.source;
        let state = self.state;
        let Some(block) = self.current.as_mut() else {
            return Err(GrainkitError::line(FORMAT, source, line_no, "no open grain block"));
        };

        if is_marker {
            return Err(if state == State::ReadingPeaks {
                GrainkitError::PeakCountMismatch {
                    path: source.to_string(),
                    grain: block.index,
                    expected: block.npeaks,
                    found: block.peaks.len(),
                }
            } else {
                GrainkitError::line(
                    FORMAT,
                    source,
                    line_no,
                    format!("grain {} is incomplete, found a new grain header", block.index),
                )
            });
        }

        block.text.push(raw.trim_end().to_string());
        if line.is_empty() || (state == State::ReadingPeaks && line.starts_with('#')) {
            return Ok(());
        }

        let index = block.index;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let next = block.advance(state, &fields).map_err(|reason| {
            GrainkitError::line(FORMAT, source, line_no, format!("grain {}: {}", index, reason))
        })?;

        self.state = next;
        if next == State::SeekingGrain {
            self.close_block()?;
        }
        Ok(())
    }

    fn open_block(&mut self, line_no: usize, line: &str) -> Result<()> {
        let caps = self
            .header_re
            .captures(line)
            .ok_or_else(|| self.error(line_no, format!("malformed grain header: '{}'", line)))?;

        let index: usize = caps[1]
            .parse()
            .map_err(|_| self.error(line_no, format!("invalid grain number '{}'", &caps[1])))?;
        let npeaks: i64 = caps[2]
            .parse()
            .map_err(|_| self.error(line_no, format!("invalid peak count '{}'", &caps[2])))?;
        self.blocks += 1;

        if npeaks < 1 {
            return match self.policy {
                BogusGrainPolicy::Abort => Err(GrainkitError::BogusGrain {
                    path: self.source.to_string(),
                    grain: index,
                    npeaks,
                }),
                BogusGrainPolicy::Skip => Ok(()),
            };
        }

        self.current = Some(PartialGrain::new(
            index,
            npeaks as usize,
            vec![line.to_string()],
        ));
        self.state = State::ReadingHeader;
        Ok(())
    }

    fn close_block(&mut self) -> Result<()> {
        if let Some(block) = self.current.take() {
            let b = b_from_u_ubi(&block.u, &block.ubi)?;
            let mut grain = Grain::new(self.source, block.index, block.u, b, block.ubi)
                .with_euler_angles(block.euler)
                .with_peaks(block.peaks)
                .with_source_text(block.text);
            if let Some(p) = block.position {
                grain = grain.with_position(p);
            }
            self.grains.push(grain);
        }
        Ok(())
    }

    fn finish(self) -> Result<Vec<Grain>> {
        let malformed = |reason: String| GrainkitError::ParseError {
            format: FORMAT.to_string(),
            path: self.source.to_string(),
            reason,
        };
        if !self.seen_preamble {
            return Err(malformed("no GrainSpotter grain marker found".into()));
        }
        if let Some(n) = self.announced.filter(|&n| n > 0 && self.blocks == 0) {
            return Err(malformed(format!(
                "header announces {} grains but no grain block was found",
                n
            )));
        }

        match (&self.current, self.state) {
            (Some(block), State::ReadingPeaks) => Err(GrainkitError::PeakCountMismatch {
                path: self.source.to_string(),
                grain: block.index,
                expected: block.npeaks,
                found: block.peaks.len(),
            }),
            (Some(block), _) => Err(GrainkitError::ParseError {
                format: FORMAT.to_string(),
                path: self.source.to_string(),
                reason: format!("unexpected end of file inside grain {}", block.index),
            }),
            (None, _) => Ok(self.grains),
        }
    }
}

impl PartialGrain {
    fn new(index: usize, npeaks: usize, text: Vec<String>) -> Self {
        PartialGrain {
            index,
            npeaks,
            position: None,
            u: [[0.0; 3]; 3],
            ubi: [[0.0; 3]; 3],
            euler: EulerAngles::default(),
            peaks: Vec::with_capacity(npeaks),
            text,
        }
    }

    /// 消费一行非空数据，返回下一个状态
    fn advance(&mut self, state: State, fields: &[&str]) -> std::result::Result<State, String> {
        let next = match state {
            State::SeekingGrain => State::SeekingGrain,
            State::ReadingHeader => State::ReadingPosition,
            State::ReadingPosition => {
                // mean_IA x y z chisq
                if fields.len() >= 4 {
                    self.position = Some(parse_floats::<3>(&fields[1..4])?);
                }
                State::ReadingU(0)
            }
            State::ReadingU(row) => {
                self.u[row] = matrix_row("U", fields)?;
                if row == 2 {
                    State::ReadingUbi(0)
                } else {
                    State::ReadingU(row + 1)
                }
            }
            State::ReadingUbi(row) => {
                self.ubi[row] = matrix_row("UBI", fields)?;
                if row == 2 {
                    State::ReadingRodrigues
                } else {
                    State::ReadingUbi(row + 1)
                }
            }
            State::ReadingRodrigues => State::ReadingEuler,
            State::ReadingEuler => {
                let [phi1, phi, phi2] = matrix_row("Euler angles", fields)?;
                self.euler = EulerAngles::new(phi1, phi, phi2);
                State::ReadingQuaternion
            }
            State::ReadingQuaternion => State::ReadingPeaks,
            State::ReadingPeaks => {
                self.peaks.push(parse_peak_row(fields)?);
                if self.peaks.len() == self.npeaks {
                    State::SeekingGrain
                } else {
                    State::ReadingPeaks
                }
            }
        };
        Ok(next)
    }
}

/// 解析 `Found 12 grains`
fn announced_grains(line: &str) -> Option<usize> {
    let mut words = line.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("Found"), Some(n), Some("grains")) => n.parse().ok(),
        _ => None,
    }
}

fn matrix_row(what: &str, fields: &[&str]) -> std::result::Result<[f64; 3], String> {
    if fields.len() < 3 {
        return Err(format!(
            "expected 3 values for {}, found {}",
            what,
            fields.len()
        ));
    }
    parse_floats::<3>(&fields[..3]).map_err(|r| format!("{}: {}", what, r))
}

fn parse_floats<const N: usize>(fields: &[&str]) -> std::result::Result<[f64; N], String> {
    let mut out = [0.0; N];
    for (slot, s) in out.iter_mut().zip(fields) {
        *slot = s
            .parse()
            .map_err(|_| format!("non-numeric value '{}'", s))?;
    }
    Ok(out)
}

fn parse_int<T: std::str::FromStr>(s: &str) -> std::result::Result<T, String> {
    s.parse().map_err(|_| format!("expected an integer, found '{}'", s))
}

/// 解析一行峰数据（22 列）
fn parse_peak_row(fields: &[&str]) -> std::result::Result<IndexedPeak, String> {
    if fields.len() < PEAK_FIELDS {
        return Err(format!(
            "peak row has {} fields, expected {}",
            fields.len(),
            PEAK_FIELDS
        ));
    }

    let f = parse_floats::<10>(&fields[12..22])?;
    Ok(IndexedPeak {
        num: parse_int(fields[0])?,
        gvector_id: parse_int(fields[1])?,
        peak_id: parse_int(fields[2])?,
        hkl: [
            parse_int(fields[3])?,
            parse_int(fields[4])?,
            parse_int(fields[5])?,
        ],
        hkl_pred: parse_floats::<3>(&fields[6..9])?,
        dhkl: parse_floats::<3>(&fields[9..12])?,
        tth_measured: f[0],
        tth_pred: f[1],
        dtth: f[2],
        omega_measured: f[3],
        omega_pred: f[4],
        domega: f[5],
        eta_measured: f[6],
        eta_pred: f[7],
        deta: f[8],
        ia: f[9],
    })
}

// ─────────────────────────────────────────────────────────────
// 写回
// ─────────────────────────────────────────────────────────────

/// 将晶粒序列化为 GrainSpotter 日志文本
///
/// 晶粒按顺序重新编号，其余行原样输出。晶粒必须带有原始文本块。
pub fn to_grainspotter_string(grains: &[Grain]) -> Result<String> {
    let header_re = header_regex();
    let mut out = String::new();
    out.push_str(&format!("Found {} grains\n", grains.len()));
    out.push_str(LOG_PREAMBLE);
    out.push('\n');

    let mut total = 0;
    for (i, grain) in grains.iter().enumerate() {
        let text = grain.source_text();
        let first = text.first().ok_or_else(|| {
            GrainkitError::InvalidArgument(format!(
                "{} from {} has no GrainSpotter text block",
                grain.name(),
                grain.file_name()
            ))
        })?;

        let rest = header_re
            .captures(first)
            .and_then(|c| c.get(3))
            .map(|m| m.as_str())
            .unwrap_or("");
        out.push_str(&format!("Grain {}, {}{}\n", i + 1, grain.npeaks(), rest));
        for line in &text[1..] {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        total += grain.npeaks();
    }

    out.push_str(&format!(
        "In total {} gvectors were assigned to {} grains\n",
        total,
        grains.len()
    ));
    Ok(out)
}

/// 保存为 GrainSpotter 日志文件
pub fn save_grainspotter(path: &Path, grains: &[Grain]) -> Result<()> {
    let content = to_grainspotter_string(grains)?;
    write_file(path, &content)
}

#[cfg(test)]
pub(crate) fn sample_block(index: usize, peak_ids: &[i64], euler: [f64; 3]) -> String {
    use crate::orientation::euler::u_from_euler;
    use crate::orientation::matrix::{inverse, mat_mul};

    let u = u_from_euler(&EulerAngles::new(euler[0], euler[1], euler[2]));
    let b = [[0.25, 0.0, 0.0], [0.0, 0.25, 0.0], [0.0, 0.0, 0.25]];
    let ubi = inverse(&mat_mul(&u, &b)).unwrap();

    let mut s = format!("Grain {}, {} of {} vectors\n", index, peak_ids.len(), peak_ids.len());
    s.push_str(&format!("{} {} {} 0\n", peak_ids.len(), peak_ids.len(), peak_ids.len()));
    s.push_str("0.0123 10.5 -3.25 5.0 0.02\n");
    for row in u.iter() {
        s.push_str(&format!("{:.12} {:.12} {:.12}\n", row[0], row[1], row[2]));
    }
    s.push('\n');
    for row in ubi.iter() {
        s.push_str(&format!("{:.12} {:.12} {:.12}\n", row[0], row[1], row[2]));
    }
    s.push_str("\n0.1 0.2 0.3\n\n");
    s.push_str(&format!("{} {} {}\n\n", euler[0], euler[1], euler[2]));
    s.push_str("0.9 0.1 0.2 0.3\n\n");
    for (i, id) in peak_ids.iter().enumerate() {
        s.push_str(&format!(
            "{} {} {} 1 1 1 1.01 0.99 1.0 0.01 -0.01 0.0 8.5{} 8.5 0.01 12.0 12.01 -0.01 45.0 45.02 -0.02 0.05\n",
            i + 1,
            id + 1000,
            id,
            i
        ));
    }
    s
}

#[cfg(test)]
pub(crate) fn sample_log(blocks: &[String]) -> String {
    let mut s = String::from("Found grains\n");
    s.push_str(LOG_PREAMBLE);
    s.push('\n');
    for b in blocks {
        s.push_str(b);
        s.push('\n');
    }
    s.push_str("In total 10 gvectors were assigned\n");
    s
}
