//! Standard LRC parser
//!
//! Parses time-coded lyrics of the form:
//!
//! ```text
//! [ti:Song Title]
//! [00:12.34]A lyric line
//! [00:15.00][01:02.00]A repeated chorus line
//! ```
//!
//! Multiple timestamps on one line duplicate the text at each time.
//! Lines sharing a timestamp (within 1 ms) become stacked layers
//! (original / translation / romanization).

use crate::models::{LyricLine, LyricsData};

/// Parse standard LRC text into lines plus metadata
///
/// Never fails: malformed lines are skipped, a file without timestamps
/// yields empty `lines` and whatever metadata could be extracted.
pub fn parse_standard(text: &str) -> LyricsData {
    let mut data = LyricsData::default();
    let mut entries: Vec<LyricLine> = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((key, value)) = parse_metadata_tag(line) {
            data.metadata.insert(key, value);
            continue;
        }

        let (timestamps, stripped) = extract_timestamps(line);
        if timestamps.is_empty() {
            continue;
        }
        for ts in timestamps {
            entries.push(LyricLine::new(ts, stripped.clone()));
        }
    }

    // Stable sort keeps input order for identical times, which layer
    // grouping below relies on.
    entries.sort_by_key(|l| l.start_time_ms);
    assign_layers(&mut entries);

    data.lines = entries;
    data
}

/// Parse a `[key:value]` metadata tag
///
/// The key must be purely alphabetic, which excludes time tags.
fn parse_metadata_tag(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let colon = inner.find(':')?;
    let key = &inner[..colon];

    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    Some((key.to_string(), inner[colon + 1..].trim().to_string()))
}

/// Extract every `[mm:ss.xx]` timestamp in the line and strip them
///
/// Returns the timestamps in appearance order and the remaining text.
/// Bracket groups that are not timestamps are left in the text untouched.
fn extract_timestamps(line: &str) -> (Vec<u64>, String) {
    let mut timestamps = Vec::new();
    let mut stripped = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find('[') {
        let (before, tail) = rest.split_at(open);
        stripped.push_str(before);

        match tail[1..].find(']') {
            Some(close) => {
                let tag = &tail[1..close + 1];
                match parse_timestamp_ms(tag) {
                    Some(ms) => timestamps.push(ms),
                    None => {
                        // Not a time tag; keep it verbatim.
                        stripped.push_str(&tail[..close + 2]);
                    }
                }
                rest = &tail[close + 2..];
            }
            None => {
                stripped.push_str(tail);
                rest = "";
            }
        }
    }
    stripped.push_str(rest);

    (timestamps, stripped.trim().to_string())
}

/// Parse a timestamp like "00:12.34", "00:12.345" or "00:12" to milliseconds
///
/// A ":" fraction separator is tolerated alongside "." since both occur in
/// the wild.
pub(crate) fn parse_timestamp_ms(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.split([':', '.']).collect();

    match parts.len() {
        2 => {
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            Some(min * 60_000 + sec * 1000)
        }
        3 => {
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            let frac = parts[2];
            let ms: u64 = match frac.len() {
                2 => frac.parse::<u64>().ok()? * 10,
                3 => frac.parse().ok()?,
                _ => return None,
            };
            Some(min * 60_000 + sec * 1000 + ms)
        }
        _ => None,
    }
}

/// Assign layer indices to a time-sorted entry list
///
/// An entry within 1 ms of the previous group's time stacks on top of it;
/// anything else starts a new group at layer 0.
fn assign_layers(entries: &mut [LyricLine]) {
    let mut group_time: Option<u64> = None;
    let mut layer = 0u32;

    for entry in entries.iter_mut() {
        match group_time {
            Some(t) if entry.start_time_ms.abs_diff(t) <= 1 => {
                layer += 1;
            }
            _ => {
                group_time = Some(entry.start_time_ms);
                layer = 0;
            }
        }
        entry.layer = layer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_ms() {
        assert_eq!(parse_timestamp_ms("00:12"), Some(12_000));
        assert_eq!(parse_timestamp_ms("01:30"), Some(90_000));
        assert_eq!(parse_timestamp_ms("00:12.34"), Some(12_340));
        assert_eq!(parse_timestamp_ms("00:12.345"), Some(12_345));
        assert_eq!(parse_timestamp_ms("00:12:34"), Some(12_340));
        assert_eq!(parse_timestamp_ms("ti:Test"), None);
        assert_eq!(parse_timestamp_ms("00:12.3456"), None);
    }

    #[test]
    fn test_metadata_and_lines() {
        let lrc = "[ti:Test]\n[ar:T]\n[00:01.00]A\n[00:02.50]B";
        let data = parse_standard(lrc);

        assert_eq!(data.metadata.get("ti").map(String::as_str), Some("Test"));
        assert_eq!(data.metadata.get("ar").map(String::as_str), Some("T"));
        assert_eq!(data.lines.len(), 2);
        assert_eq!(data.lines[0].start_time_ms, 1000);
        assert_eq!(data.lines[0].text, "A");
        assert_eq!(data.lines[0].layer, 0);
        assert_eq!(data.lines[1].start_time_ms, 2500);
        assert_eq!(data.lines[1].text, "B");
    }

    #[test]
    fn test_repeated_chorus_timestamps() {
        let lrc = "[00:10.00][01:10.00]Chorus";
        let data = parse_standard(lrc);

        assert_eq!(data.lines.len(), 2);
        assert_eq!(data.lines[0].start_time_ms, 10_000);
        assert_eq!(data.lines[1].start_time_ms, 70_000);
        assert!(data.lines.iter().all(|l| l.text == "Chorus"));
    }

    #[test]
    fn test_layer_grouping() {
        let lrc = "[00:01.00]O\n[00:01.00]T";
        let data = parse_standard(lrc);

        assert_eq!(data.lines.len(), 2);
        assert_eq!(data.lines[0].start_time_ms, 1000);
        assert_eq!(data.lines[1].start_time_ms, 1000);
        assert_eq!(data.lines[0].layer, 0);
        assert_eq!(data.lines[1].layer, 1);
        assert_eq!(data.lines[0].text, "O");
        assert_eq!(data.lines[1].text, "T");
    }

    #[test]
    fn test_layer_grouping_one_ms_tolerance() {
        let lrc = "[00:01.00]a\n[00:01.001]b\n[00:01.05]c";
        let data = parse_standard(lrc);

        assert_eq!(data.lines[0].layer, 0);
        assert_eq!(data.lines[1].layer, 1);
        assert_eq!(data.lines[2].layer, 0);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let lrc = "[00:05.00]late\n[00:01.00]early";
        let data = parse_standard(lrc);

        assert_eq!(data.lines[0].text, "early");
        assert_eq!(data.lines[1].text, "late");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let lrc = "[00:xx.00]broken\nno brackets at all\n[00:03.00]good";
        let data = parse_standard(lrc);

        assert_eq!(data.lines.len(), 1);
        assert_eq!(data.lines[0].text, "good");
    }

    #[test]
    fn test_no_timestamps_yields_metadata_only() {
        let lrc = "[ti:Only Meta]\njust text";
        let data = parse_standard(lrc);

        assert!(data.lines.is_empty());
        assert_eq!(
            data.metadata.get("ti").map(String::as_str),
            Some("Only Meta")
        );
    }

    #[test]
    fn test_lines_sorted_invariant() {
        let lrc = "[00:09.00]i\n[00:03.00]c\n[00:03.00]c2\n[00:07.10]g\n[00:00.50]a";
        let data = parse_standard(lrc);

        for pair in data.lines.windows(2) {
            assert!(pair[0].start_time_ms <= pair[1].start_time_ms);
        }
    }
}
