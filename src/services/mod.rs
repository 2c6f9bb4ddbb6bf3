pub mod catalog;
pub use catalog::{Catalog, EpisodeList, JsonGenerator};

pub mod identity;
pub use identity::{IdentityOutcome, IdentityResolver, Provenance, ResolveMode};

pub mod streaming;
pub use streaming::{StreamingOutcome, StreamingResolver};

pub mod pipeline;
pub use pipeline::{Collaborators, Pipeline, PipelineOptions, RunSummary};

pub mod ratings;
