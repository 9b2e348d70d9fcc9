//! LRC and enhanced-LRC parsing
//!
//! `standard` handles `[mm:ss.xx]` line tags, `[key:value]` metadata and
//! layer grouping of identically-timed lines. `enhanced` composes the
//! standard parser and adds per-syllable `<mm:ss.xx>` marker handling.

pub mod enhanced;
pub mod standard;

pub use enhanced::parse_enhanced;
pub use standard::parse_standard;
