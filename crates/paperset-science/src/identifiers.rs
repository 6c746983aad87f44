//! Resolution of the `pid` that ties papers, citations and authors together.

use paperset_core::RawRecord;
use sha1::{Digest, Sha1};

use crate::normalize::norm;

pub const OPENALEX_PREFIX: &str = "oa:";
pub const DOI_PREFIX: &str = "doi:";
pub const SEMANTIC_SCHOLAR_PREFIX: &str = "s2:";
pub const HASH_PREFIX: &str = "hash:";

/// Hex digits kept from the SHA-1 of the fallback seed. Changing this changes
/// every fallback pid already published.
const HASH_HEX_LEN: usize = 20;

const KNOWN_PREFIXES: [&str; 3] = [OPENALEX_PREFIX, DOI_PREFIX, SEMANTIC_SCHOLAR_PREFIX];

/// `oa:<openalex_id>`, else `doi:<doi>`, else a hash of title, first author
/// and year.
pub fn resolve_pid(record: &RawRecord) -> String {
    if let Some(id) = non_empty(record.openalex_id.as_deref()) {
        return format!("{OPENALEX_PREFIX}{id}");
    }
    if let Some(doi) = non_empty(record.doi.as_deref()) {
        return format!("{DOI_PREFIX}{doi}");
    }
    format!("{HASH_PREFIX}{}", fallback_hash(record))
}

/// Seed is `lower(norm(title)) | first author | year`. Only the first author
/// takes part, so sources that reorder authors get different hashes.
fn fallback_hash(record: &RawRecord) -> String {
    let year = record
        .year
        .filter(|year| *year != 0)
        .map(|year| year.to_string())
        .unwrap_or_default();
    let seed = format!(
        "{}|{}|{}",
        norm(&record.title).to_lowercase(),
        record.first_author(),
        year
    );

    let digest = hex::encode(Sha1::digest(seed.as_bytes()));
    digest[..HASH_HEX_LEN].to_string()
}

/// Reference ids without a recognized provider prefix are OpenAlex work ids.
pub fn prefix_reference(reference: &str) -> String {
    if KNOWN_PREFIXES.iter().any(|prefix| reference.starts_with(prefix)) {
        reference.to_string()
    } else {
        format!("{OPENALEX_PREFIX}{reference}")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
