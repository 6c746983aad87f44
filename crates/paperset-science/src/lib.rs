//! paperset science: OpenAlex fetch, normalization, identity, dedup.

pub mod dedup;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod normalize;
pub mod pipeline;
pub mod sources;

pub use dedup::{DedupKey, MergeOutcome, PaperTable, completeness_score};
pub use error::{Result, ScienceError};
pub use identifiers::{prefix_reference, resolve_pid};
pub use normalize::{ABSTRACT_MAX_CHARS, norm, normalize_abstract, reconstruct_abstract};
pub use pipeline::{PaperFolder, normalize_file};
pub use sources::OpenAlexFetcher;
