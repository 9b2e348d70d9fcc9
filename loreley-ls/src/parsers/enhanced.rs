//! Enhanced LRC parser
//!
//! Adds per-syllable timing on top of the standard parser:
//!
//! ```text
//! [00:01.00]<00:01.00>He<00:01.50>llo
//! ```
//!
//! Each `<mm:ss.xx>` marker opens a syllable that runs to the next marker;
//! the final syllable's duration is unknown and stored as 0.

use super::standard::{parse_standard, parse_timestamp_ms};
use crate::models::{LyricLine, LyricsData, Syllable};

/// Parse enhanced LRC text
///
/// Runs the standard parser first, then rewrites each line that carries
/// inline time markers. Lines without markers pass through unchanged, so
/// this parser subsumes the standard one.
pub fn parse_enhanced(text: &str) -> LyricsData {
    let mut data = parse_standard(text);

    for line in &mut data.lines {
        enhance_line(line);
    }

    data
}

/// Split a line's text on inline time markers into timed syllables
///
/// Rewrites `line.text` to the marker-free concatenation and stores syllable
/// start times relative to the line start. A line whose text has no valid
/// markers is left untouched.
fn enhance_line(line: &mut LyricLine) {
    let Some((prefix, segments)) = extract_markers(&line.text) else {
        return;
    };

    let mut syllables = Vec::with_capacity(segments.len());
    let mut rebuilt = String::with_capacity(line.text.len());

    // Text before the first marker has no timing; keep it in the line text.
    rebuilt.push_str(&prefix);

    for (i, (time_ms, text)) in segments.iter().enumerate() {
        let start = time_ms.saturating_sub(line.start_time_ms);
        let duration = match segments.get(i + 1) {
            Some((next_ms, _)) => next_ms.saturating_sub(*time_ms),
            None => 0,
        };

        rebuilt.push_str(text);
        syllables.push(Syllable {
            start_time_ms: start,
            duration_ms: duration,
            text: text.clone(),
        });
    }

    line.text = rebuilt;
    line.syllables = Some(syllables);
}

/// Scan a line for `<mm:ss.xx>` markers
///
/// Returns the untimed text before the first marker plus one
/// `(absolute time, following text)` segment per marker, or None when the
/// line has no valid markers. Angle-bracket groups that do not parse as
/// timestamps are treated as ordinary text.
fn extract_markers(text: &str) -> Option<(String, Vec<(u64, String)>)> {
    let mut prefix = String::new();
    let mut segments: Vec<(u64, String)> = Vec::new();
    let mut pending = String::new();
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        let (before, tail) = rest.split_at(open);
        pending.push_str(before);

        match tail[1..].find('>') {
            Some(close) => {
                let tag = &tail[1..close + 1];
                match parse_timestamp_ms(tag) {
                    Some(ms) => {
                        let gathered = std::mem::take(&mut pending);
                        if segments.is_empty() {
                            prefix = gathered;
                        } else if let Some(last) = segments.last_mut() {
                            last.1 = gathered;
                        }
                        segments.push((ms, String::new()));
                    }
                    None => pending.push_str(&tail[..close + 2]),
                }
                rest = &tail[close + 2..];
            }
            None => {
                pending.push_str(tail);
                rest = "";
            }
        }
    }
    pending.push_str(rest);

    let last = segments.last_mut()?;
    last.1 = pending;
    Some((prefix, segments))
}
