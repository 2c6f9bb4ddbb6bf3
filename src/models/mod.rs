pub mod episode;
pub mod lenient;
pub mod movie;
pub mod run;
pub mod streaming;

pub use episode::{EpisodeCandidate, EpisodeListEntry};
pub use movie::{HostRatings, MovieMetadata, MovieRecord};
pub use run::{RunError, RunMetadata, Stage};
pub use streaming::{StreamingOption, StreamingSnapshot, StreamingType, dedupe_options};
