//! Unified diff generation between cached and current file content.

use similar::TextDiff;

/// Unified diff between two line sets, headed `a/<label>` vs `b/<label>`,
/// three lines of context.  Returns `None` when the content is unchanged.
pub fn generate_diff(old_lines: &[String], new_lines: &[String], label: &str) -> Option<Vec<String>> {
    if old_lines == new_lines {
        return None;
    }

    let old_text = to_text(old_lines);
    let new_text = to_text(new_lines);
    let diff = TextDiff::from_lines(&old_text, &new_text);
    let unified = diff
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{label}"), &format!("b/{label}"))
        .to_string();

    Some(unified.lines().map(str::to_string).collect())
}

fn to_text(lines: &[String]) -> String {
    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    /// Minimal unified-diff apply, enough to verify round-trips: replay
    /// hunks against the old content and rebuild the new content.
    fn apply_unified(old: &[String], diff: &[String]) -> Vec<String> {
        let mut result = Vec::new();
        let mut cursor = 0usize;

        for line in diff {
            if line.starts_with("--- ") || line.starts_with("+++ ") {
                continue;
            }
            if let Some(rest) = line.strip_prefix("@@ ") {
                let old_start: usize = rest
                    .split_whitespace()
                    .next()
                    .and_then(|tok| tok.trim_start_matches('-').split(',').next())
                    .and_then(|n| n.parse().ok())
                    .unwrap();
                while cursor < old_start.saturating_sub(1) {
                    result.push(old[cursor].clone());
                    cursor += 1;
                }
            } else if let Some(ctx) = line.strip_prefix(' ') {
                result.push(ctx.to_string());
                cursor += 1;
            } else if let Some(added) = line.strip_prefix('+') {
                result.push(added.to_string());
            } else if line.starts_with('-') {
                cursor += 1;
            }
        }
        while cursor < old.len() {
            result.push(old[cursor].clone());
            cursor += 1;
        }
        result
    }

    #[test]
    fn unchanged_content_yields_no_diff() {
        let content = lines(&["a", "b"]);
        assert!(generate_diff(&content, &content, "p/f.txt").is_none());
    }

    #[test]
    fn diff_carries_synthetic_headers() {
        let diff = generate_diff(&lines(&["a"]), &lines(&["b"]), "proj/src/lib.rs").unwrap();
        assert_eq!(diff[0], "--- a/proj/src/lib.rs");
        assert_eq!(diff[1], "+++ b/proj/src/lib.rs");
    }

    #[test]
    fn new_file_diff_is_all_additions() {
        let new = lines(&["one", "two", "three"]);
        let diff = generate_diff(&[], &new, "p/new.txt").unwrap();
        let added: Vec<&str> = diff
            .iter()
            .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
            .map(|l| &l[1..])
            .collect();
        assert_eq!(added, vec!["one", "two", "three"]);
        assert!(!diff.iter().any(|l| l.starts_with('-') && !l.starts_with("---")));
    }

    #[test]
    fn modification_round_trips() {
        let old = lines(&["fn main() {", "    println!(\"hi\");", "}"]);
        let new = lines(&["fn main() {", "    println!(\"hello\");", "    run();", "}"]);

        let diff = generate_diff(&old, &new, "p/main.rs").unwrap();
        assert_eq!(apply_unified(&old, &diff), new);
    }

    #[test]
    fn distant_edits_round_trip_across_hunks() {
        // Two edits far enough apart that the 3-line context cannot bridge
        // them, forcing multiple hunks.
        let old: Vec<String> = (0..30).map(|i| format!("line {i}")).collect();
        let mut new = old.clone();
        new[2] = "changed near the top".to_string();
        new[27] = "changed near the bottom".to_string();

        let diff = generate_diff(&old, &new, "p/big.txt").unwrap();
        let hunk_count = diff.iter().filter(|l| l.starts_with("@@")).count();
        assert!(hunk_count >= 2);
        assert_eq!(apply_unified(&old, &diff), new);
    }

    #[test]
    fn deletion_round_trips() {
        let old = lines(&["keep", "drop me", "keep too"]);
        let new = lines(&["keep", "keep too"]);

        let diff = generate_diff(&old, &new, "p/f.txt").unwrap();
        assert!(diff.iter().any(|l| l == "-drop me"));
        assert_eq!(apply_unified(&old, &diff), new);
    }
}
