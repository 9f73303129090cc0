//! Major-change classification: decides which file modifications are
//! structurally significant enough to record.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;

use similar::TextDiff;

/// Extensions the structural-keyword check applies to.
const CODE_EXTENSIONS: &[&str] = &["py", "js", "ts", "java", "cpp", "c", "go", "rs"];

/// Keywords that mark a changed line as structural, matched
/// case-insensitively against normalized lines.
const CODE_KEYWORDS: &[&str] = &[
    "def ", "class ", "function ", "import ", "from ", "if ", "for ", "while ", "return ",
    "async ", "await ", "try ", "except ", "catch ", "throw ", "func ", "fn ", "match ",
];

/// Significance filter for file modifications.  When `enabled` is false every
/// change is significant and [`normalize_line`](Self::normalize_line) is a
/// pass-through.
#[derive(Debug, Clone)]
pub struct ChangeClassifier {
    pub enabled: bool,
    pub min_lines_changed: usize,
    pub similarity_threshold: f64,
}

impl ChangeClassifier {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_lines_changed: 3,
            similarity_threshold: 0.7,
        }
    }

    /// Strip surrounding whitespace, blank out comment-only lines (`#`, `//`)
    /// and collapse internal whitespace runs to a single space.
    pub fn normalize_line(&self, line: &str) -> String {
        if !self.enabled {
            return line.to_string();
        }

        let normalized = line.trim();
        if normalized.is_empty() || normalized.starts_with('#') || normalized.starts_with("//") {
            return String::new();
        }

        normalized.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// A change is major when any of:
    /// - an added/removed normalized line contains a structural keyword and
    ///   the file has a recognized code extension,
    /// - the count of distinct added+removed normalized lines reaches
    ///   `min_lines_changed`,
    /// - a positionally-paired old/new line pair falls below
    ///   `similarity_threshold`.
    pub fn is_major_change(&self, old_lines: &[String], new_lines: &[String], path: &Path) -> bool {
        if !self.enabled {
            return true;
        }

        let old_norm: Vec<String> = old_lines.iter().map(|l| self.normalize_line(l)).collect();
        let new_norm: Vec<String> = new_lines.iter().map(|l| self.normalize_line(l)).collect();

        let old_set: HashSet<&str> = old_norm
            .iter()
            .filter(|l| !l.is_empty())
            .map(String::as_str)
            .collect();
        let new_set: HashSet<&str> = new_norm
            .iter()
            .filter(|l| !l.is_empty())
            .map(String::as_str)
            .collect();

        let added: Vec<&str> = new_set.difference(&old_set).copied().collect();
        let removed: Vec<&str> = old_set.difference(&new_set).copied().collect();
        let total_changes = added.len() + removed.len();

        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if CODE_EXTENSIONS.contains(&ext.as_str()) {
            for line in added.iter().chain(removed.iter()) {
                let lowered = line.to_lowercase();
                if CODE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
                    return true;
                }
            }
        }

        if total_changes >= self.min_lines_changed {
            return true;
        }

        // Catch heavy rewrites of individual lines that survive the set
        // checks (same line count, low textual overlap).
        for (old_line, new_line) in old_norm.iter().zip(new_norm.iter()) {
            if old_line != new_line && similarity_ratio(old_line, new_line) < self.similarity_threshold
            {
                return true;
            }
        }

        false
    }
}

/// Longest-matching-blocks similarity ratio in [0.0, 1.0].
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    TextDiff::from_chars(a, b).ratio() as f64
}

// ── Tests ────────────────────────────────────────────────────────────────────
