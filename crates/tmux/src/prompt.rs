//! Shell-prompt heuristics: deciding whether a pane is idle, pulling the
//! last command out of the buffer, and slicing out its output.
//!
//! These are heuristics over rendered screen text, not a shell protocol.
//! They cover the common bash/zsh/fish/starship prompt shapes plus the
//! Python REPL; exotic prompts simply produce no events.

use std::sync::OnceLock;

use regex::Regex;

/// Trailing characters that mark a shell waiting for input.
const PROMPT_TERMINATORS: &[&str] = &[
    "$", "%", ">", ">>", ">>>", "❯", "➜", "✗", "✓", "→", "»", "⟩", "#",
];

/// Unicode glyphs used by styled prompts (starship, oh-my-zsh themes).
const STYLED_PROMPT_GLYPHS: &[char] = &['❯', '➜', '→', '»', '⟩'];

/// Commands too noisy to record.
const NOISE_COMMANDS: &[&str] = &["ls", "cd", "pwd", "echo", "cat", "clear", "history"];

fn regex_set(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static prompt regex"))
        .collect()
}

/// Prompt shapes for finished detection: user@host:path$, venv prefix,
/// bracketed prefix, generic word + terminator, bare terminator run.
fn prompt_shapes() -> &'static [Regex] {
    static SHAPES: OnceLock<Vec<Regex>> = OnceLock::new();
    SHAPES.get_or_init(|| {
        regex_set(&[
            r".*[@:].*[$%>❯➜#]\s*$",
            r"^[^@]*@[^:]*:[^$%>❯➜#]*[$%>❯➜#]\s*$",
            r"^\([^)]+\)\s*[$%>❯➜#]\s*$",
            r"^\[[^\]]+\]\s*[$%>❯➜#]\s*$",
            r"^.*\s+[$%>❯➜#]\s*$",
            r"^\w+\s*[$%>❯➜#]\s*$",
            r"^[$%>❯➜#]+\s*$",
        ])
    })
}

fn home_tail_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r".*~[>$]\s*$").expect("static prompt regex"))
}

fn bash_command_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^[^$]*\$\s*(.+)$").expect("static prompt regex"))
}

/// Command-bearing line shapes, used when locating the line a command was
/// typed on.
fn command_shapes() -> &'static [Regex] {
    static SHAPES: OnceLock<Vec<Regex>> = OnceLock::new();
    SHAPES.get_or_init(|| {
        regex_set(&[
            r"^[^$]*\$\s*.+$",
            r"^.*[❯➜→»⟩]\s*.+$",
            r"^>>>\s*.+$",
        ])
    })
}

/// Bare-prompt line shapes: a prompt with nothing typed after it, the
/// boundary that ends a command's output.
fn bare_prompt_shapes() -> &'static [Regex] {
    static SHAPES: OnceLock<Vec<Regex>> = OnceLock::new();
    SHAPES.get_or_init(|| regex_set(&[r"^[^$]*\$$", r"^.*[❯➜→»⟩]$", r"^>>>$"]))
}

/// Does the trailing line of the pane indicate an idle shell?  Only the
/// last line is examined.
pub fn is_command_finished(pane_content: &str) -> bool {
    let Some(last_line) = pane_content.trim().lines().last() else {
        return false;
    };
    let last_line = last_line.trim();

    if PROMPT_TERMINATORS
        .iter()
        .any(|indicator| last_line.ends_with(indicator))
    {
        return true;
    }

    if prompt_shapes().iter().any(|shape| shape.is_match(last_line)) {
        return true;
    }

    home_tail_shape().is_match(last_line)
}

/// Reject empty strings, over-long lines, and denylisted noise commands.
pub fn is_valid_command(cmd: &str) -> bool {
    let tokens: Vec<&str> = cmd.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return false;
    };
    if tokens.len() > 10 {
        return false;
    }
    !NOISE_COMMANDS.contains(first)
}

/// Extract the most recently executed command from a finished pane.
///
/// Scans backward from the second-to-last line trying, per line: a bash
/// `$`-prompt match, a styled-glyph split, then a REPL `>>> ` prefix.  The
/// first candidate that passes [`is_valid_command`] wins.
pub fn extract_command(pane_content: &str) -> Option<String> {
    if !is_command_finished(pane_content) {
        return None;
    }

    let lines: Vec<&str> = pane_content.trim().lines().collect();
    if lines.len() < 2 {
        return None;
    }

    for raw in lines[..lines.len() - 1].iter().rev() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = bash_command_shape().captures(line) {
            let cmd = caps[1].trim();
            if is_valid_command(cmd) {
                return Some(cmd.to_string());
            }
        }

        for glyph in STYLED_PROMPT_GLYPHS {
            if let Some((_, rest)) = line.split_once(*glyph) {
                let cmd = rest.trim();
                if !cmd.is_empty() && is_valid_command(cmd) {
                    return Some(cmd.to_string());
                }
            }
        }

        if let Some(rest) = line.strip_prefix(">>> ") {
            let cmd = rest.trim();
            if !cmd.is_empty() && is_valid_command(cmd) {
                return Some(cmd.to_string());
            }
        }
    }

    None
}

/// Slice out the last command and its output: from the last command-bearing
/// line up to (but excluding) the next bare prompt, or end of buffer.
pub fn extract_last_command_output(pane_content: &str) -> String {
    let lines: Vec<&str> = pane_content.trim().lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let Some(command_idx) = lines
        .iter()
        .rposition(|raw| command_shapes().iter().any(|shape| shape.is_match(raw.trim())))
    else {
        return String::new();
    };

    let boundary = lines[command_idx + 1..]
        .iter()
        .position(|raw| {
            bare_prompt_shapes()
                .iter()
                .any(|shape| shape.is_match(raw.trim()))
        })
        .map(|offset| command_idx + 1 + offset)
        .unwrap_or(lines.len());

    lines[command_idx..boundary].join("\n")
}

// ── Tests ────────────────────────────────────────────────────────────────────
