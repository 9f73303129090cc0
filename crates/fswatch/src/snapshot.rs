//! Per-file snapshot state and the low-level read/hash helpers.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// How many leading bytes the binary sniffer inspects.
const SNIFF_BYTES: usize = 4096;

/// Cached view of a watched file as of the last successful scan.
///
/// Snapshots are only ever created or overwritten; a file that disappears
/// keeps its last snapshot for the process lifetime.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    /// SHA-256 of the raw bytes, hex-encoded.
    pub fingerprint: String,
    /// Cached content lines.  Empty for binary files.
    pub lines: Vec<String>,
    pub is_binary: bool,
}

/// Content fingerprint for O(1) change detection without retaining bytes.
pub fn fingerprint_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Sniff a bounded prefix of the file: any byte outside the text-like set
/// (common control chars plus the printable range, DEL excluded) marks the
/// file as binary.
pub fn is_binary(path: &Path) -> io::Result<bool> {
    let mut prefix = Vec::with_capacity(SNIFF_BYTES);
    fs::File::open(path)?
        .take(SNIFF_BYTES as u64)
        .read_to_end(&mut prefix)?;
    Ok(prefix.iter().any(|&b| !is_text_byte(b)))
}

fn is_text_byte(b: u8) -> bool {
    matches!(b, 7 | 8 | 9 | 10 | 12 | 13 | 27) || (b >= 0x20 && b != 0x7f)
}

/// Read a text file as lines, replacing invalid UTF-8 rather than failing.
pub fn read_lines(path: &Path) -> Option<Vec<String>> {
    let bytes = fs::read(path).ok()?;
    let text = String::from_utf8_lossy(&bytes);
    Some(text.lines().map(str::to_string).collect())
}

// ── Tests ────────────────────────────────────────────────────────────────────
