pub mod openalex;

pub use openalex::{OpenAlexFetcher, record_from_work};
