//! Consistent colored terminal output for the hoist CLI.
//!
//! All user-facing output goes through these helpers so colors are uniform.
//! Colors are automatically disabled when stdout/stderr is not a TTY.

use colored::Colorize;

// ---------- Prefixes / Labels ----------

/// Format the tool banner: "hoist: folder -> repo-name"
pub fn banner(folder: &str, repo: &str) -> String {
    format!(
        "{}: {} {} {}",
        "hoist".bold().cyan(),
        folder,
        "->".dimmed(),
        repo.bold()
    )
}

// ---------- Status indicators ----------

/// Green checkmark + message (success)
pub fn success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg)
}

/// Yellow warning + message
pub fn warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg)
}

/// Red error + message
pub fn error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg)
}

/// Dim info/hint message
pub fn hint(msg: &str) -> String {
    format!("{}", msg.dimmed())
}

// ---------- Progress ----------

/// Render one workflow progress event for the terminal.
///
/// The worker prefixes its own lines ("✓ ", "Warning: ", "Error: "); this
/// only adds color and the optional percent gutter.
pub fn progress_line(text: &str, is_error: bool, percent: Option<u8>) -> String {
    let line = if is_error {
        text.red().to_string()
    } else if let Some(rest) = text.strip_prefix("✓ ") {
        format!("{} {}", "✓".green().bold(), rest)
    } else if text.starts_with("Warning: ") {
        text.yellow().to_string()
    } else {
        text.dimmed().to_string()
    };

    match percent {
        Some(p) => format!("{} {}", format!("[{:>3}%]", p).dimmed(), line),
        None => format!("       {}", line),
    }
}

// ---------- Summary formatting ----------

/// Format a key-value summary line with aligned values
pub fn summary_line(key: &str, value: &str) -> String {
    format!("  {:<14} {}", format!("{}:", key).dimmed(), value)
}

/// Format a commit hash (short, colored)
pub fn commit_hash(hash: &str) -> String {
    format!("{}", hash.yellow())
}

/// Format a repository URL so it stands out in the final summary
pub fn url(value: &str) -> String {
    format!("{}", value.cyan().underline())
}

// ---------- Section headers ----------

/// Bold section label: "Pre-flight checks:", etc.
pub fn section(label: &str) -> String {
    format!("{}", label.bold())
}

// ---------- Sizes ----------

/// Human-readable byte count: "512 B", "3.4 KiB", "1.25 MiB"
pub fn human_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

    let b = bytes as f64;
    if b >= GIB {
        format!("{:.2} GiB", b / GIB)
    } else if b >= MIB {
        format!("{:.2} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}
