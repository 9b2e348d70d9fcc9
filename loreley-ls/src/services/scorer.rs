//! Candidate relevance scoring
//!
//! Composite fuzzy score of a provider candidate against the requested
//! track. Weights: title 40, artist 30, album 20, duration bonus/penalty
//! ±10. Alternate titles and artists attached by the query resolver are all
//! evaluated; the best combination wins.

use super::similarity::similarity;
use crate::models::{LyricCandidate, SongInformation};
use std::collections::HashSet;

const TITLE_WEIGHT: f64 = 40.0;
const ARTIST_WEIGHT: f64 = 30.0;
const ALBUM_WEIGHT: f64 = 20.0;

/// Score a candidate against the target track
///
/// Returns the rounded maximum over the primary (title, artists) pair and
/// every alias combination.
pub fn score(target: &SongInformation, candidate: &LyricCandidate) -> i32 {
    let primary_artists: Vec<String> = target.artists.clone();

    let mut best = score_pair(target, &target.title, &primary_artists, candidate);

    if let Some(aliases) = &target.search_aliases {
        for alias_title in &aliases.titles {
            best = best.max(score_pair(target, alias_title, &primary_artists, candidate));
        }
        for alias_artist in &aliases.artists {
            let alias_artists = vec![alias_artist.clone()];
            best = best.max(score_pair(target, &target.title, &alias_artists, candidate));
            for alias_title in &aliases.titles {
                best = best.max(score_pair(target, alias_title, &alias_artists, candidate));
            }
        }
    }

    best.round() as i32
}

/// Score a single (title, artists) variant against the candidate
fn score_pair(
    target: &SongInformation,
    title: &str,
    artists: &[String],
    candidate: &LyricCandidate,
) -> f64 {
    let mut total = similarity(title, &candidate.title) * TITLE_WEIGHT;
    total += artist_score(artists, &candidate.artist) * ARTIST_WEIGHT;

    if !target.album.is_empty() && !candidate.album.is_empty() {
        total += similarity(&target.album, &candidate.album) * ALBUM_WEIGHT;
    }

    if target.duration_ms > 0 && candidate.duration_ms > 0 {
        total += duration_score(target.duration_ms.abs_diff(candidate.duration_ms));
    }

    total
}

/// Graduated duration bonus/penalty
///
/// Within a second is a strong signal; beyond twenty seconds the candidate
/// is almost certainly a different recording.
fn duration_score(diff_ms: u64) -> f64 {
    match diff_ms {
        0..=1000 => 10.0,
        1001..=3000 => 7.0,
        3001..=5000 => 4.0,
        5001..=10000 => 0.0,
        10001..=20000 => -5.0,
        _ => -10.0,
    }
}

/// Artist match quality in `[0.0, 1.0]`
///
/// Token-set inclusion (either side contains the other) is a full match,
/// which handles collaborations listed with extra artists. Otherwise Jaccard
/// overlap, with a whole-string similarity fallback when the overlap is weak
/// (tokenization fails on artists whose names contain separators).
fn artist_score(target_artists: &[String], candidate_artist: &str) -> f64 {
    let target_tokens = tokenize_artists(&target_artists.join(" "));
    let candidate_tokens = tokenize_artists(candidate_artist);

    if target_tokens.is_subset(&candidate_tokens) || candidate_tokens.is_subset(&target_tokens) {
        return 1.0;
    }

    let intersection = target_tokens.intersection(&candidate_tokens).count();
    let union = target_tokens.union(&candidate_tokens).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    };

    if jaccard <= 0.5 {
        let fallback = similarity(&target_artists.join(" "), candidate_artist);
        jaccard.max(fallback)
    } else {
        jaccard
    }
}

/// Split an artist string into lowercase name tokens
fn tokenize_artists(s: &str) -> HashSet<String> {
    s.replace(['&', '/'], ",")
        .split([',', ' ', '\t'])
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
