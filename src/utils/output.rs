//! # 终端输出工具
//!
//! 统一的状态前缀 (`[OK]`, `[ERR]`, `[WARN]`, ...) 与标题样式。
//!
//! ## 依赖关系
//! - 被 `commands/` 和 `main.rs` 使用
//! - 使用 `colored` crate

use colored::Colorize;
use std::path::Path;

pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 错误输出到 stderr
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

pub fn print_skip(msg: &str) {
    println!("{} {}", "[SKIP]".dimmed(), msg);
}

pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 文件已写出：`[OK] <what> -> <path>`
pub fn print_saved(what: &str, path: &Path) {
    println!(
        "{} {} {} {}",
        "[OK]".green().bold(),
        what,
        "->".cyan(),
        path.display().to_string().bold()
    );
}

/// 标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}
