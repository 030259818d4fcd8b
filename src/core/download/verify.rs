//! Structural integrity check for NDJSON artifacts
//!
//! A truncated or garbled download almost always shows up at the edges of
//! the file, so only the first line and the last non-empty line are parsed.
//! The last line is located by reading backwards from the end in a window
//! that doubles until it contains a newline.

use crate::domain::{Result, SyncError};
use serde::de::IgnoredAny;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

const INITIAL_WINDOW: u64 = 4096;

/// Check that the first and last non-empty lines of `path` are complete JSON values
///
/// # Errors
///
/// Returns [`SyncError::Verification`] for an empty file or an unparseable
/// edge line, and [`SyncError::Io`] if the file cannot be read.
pub fn verify_ndjson(path: &Path) -> Result<()> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();

    let mut first = Vec::new();
    BufReader::new(&mut file).read_until(b'\n', &mut first)?;
    let first = trim_ascii(&first);
    if first.is_empty() {
        return Err(SyncError::Verification(format!(
            "Artifact {} is empty or starts with a blank line",
            path.display()
        )));
    }
    parse_line(first).map_err(|e| {
        SyncError::Verification(format!(
            "First line of {} is not valid JSON: {e}",
            path.display()
        ))
    })?;

    let last = last_non_empty_line(&mut file, len)?.ok_or_else(|| {
        SyncError::Verification(format!("Artifact {} has no content", path.display()))
    })?;
    parse_line(&last).map_err(|e| {
        SyncError::Verification(format!(
            "Last line of {} is not valid JSON (truncated download?): {e}",
            path.display()
        ))
    })?;

    Ok(())
}

fn parse_line(line: &[u8]) -> std::result::Result<(), serde_json::Error> {
    serde_json::from_slice::<IgnoredAny>(line).map(|_| ())
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace());
    match (start, end) {
        (Some(s), Some(e)) => &bytes[s..=e],
        _ => &[],
    }
}

/// Bytes of the last line that is not blank, without its line terminator
fn last_non_empty_line(file: &mut File, len: u64) -> Result<Option<Vec<u8>>> {
    let mut window = INITIAL_WINDOW;

    loop {
        let start = len.saturating_sub(window);
        file.seek(SeekFrom::Start(start))?;
        let mut buf = Vec::with_capacity((len - start) as usize);
        file.by_ref().take(len - start).read_to_end(&mut buf)?;

        match buf.iter().rposition(|b| !b.is_ascii_whitespace()) {
            Some(end) => {
                let content = &buf[..=end];
                if let Some(newline) = content.iter().rposition(|&b| b == b'\n') {
                    return Ok(Some(trim_ascii(&content[newline + 1..]).to_vec()));
                }
                if start == 0 {
                    return Ok(Some(trim_ascii(content).to_vec()));
                }
            }
            None if start == 0 => return Ok(None),
            None => {}
        }

        window = window.saturating_mul(2);
    }
}
