//! Service modules for lyrics resolution

pub mod aggregator;
pub mod query_resolver;
pub mod recording_registry;
pub mod scorer;
pub mod selection_controller;
pub mod similarity;
pub mod synchronizer;

pub use aggregator::Aggregator;
pub use query_resolver::{QueryResolver, ResolvedQuery};
pub use recording_registry::{
    MusicBrainzRegistry, RecordingHit, RecordingRegistry, RegistryError,
};
pub use selection_controller::{LoadOptions, SelectionController, DEFAULT_SEARCH_LIMIT};
pub use similarity::similarity;
