//! HTTP API handlers for the lyrics service
//!
//! REST endpoints for loading, selecting and querying lyrics, plus an SSE
//! stream of state-change events.

pub mod health;
pub mod lyrics;
pub mod sse;

pub use health::health_routes;
pub use lyrics::lyrics_routes;
pub use sse::lyrics_event_stream;
