//! Data models for the lyrics service

pub mod candidate;
pub mod lyrics;
pub mod song_info;

pub use candidate::{LyricCandidate, EMBEDDED_SOURCE, EMBEDDED_SYNTHETIC_SCORE, LOCAL_SOURCE, LOCAL_SYNTHETIC_SCORE};
pub use lyrics::{LyricLine, LyricsData, Syllable};
pub use song_info::{SearchAliases, SongInformation};
