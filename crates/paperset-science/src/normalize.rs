//! Text normalization shared by titles, abstracts and venues.

use paperset_core::RawAbstract;

/// Hard cap on abstract length, in characters.
pub const ABSTRACT_MAX_CHARS: usize = 4000;

/// Trim and collapse every whitespace run (newlines and tabs included) to a
/// single space.
pub fn norm(s: &str) -> String {
    s.split(is_space)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unicode whitespace plus the ASCII information separators U+001C..=U+001F.
fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Plain text of an abstract, whichever shape it arrived in.
pub fn abstract_text(raw: Option<&RawAbstract>) -> String {
    match raw {
        None => String::new(),
        Some(RawAbstract::Text(text)) => text.clone(),
        Some(RawAbstract::InvertedIndex(index)) => reconstruct_abstract(index),
    }
}

/// Rebuild prose from a word → positions index.
///
/// Positions are only ordered, never allocated, so gaps and arbitrarily large
/// positions cost nothing. When two words claim the same position the one
/// listed later in the index wins.
pub fn reconstruct_abstract(index: &[(String, Vec<u64>)]) -> String {
    let mut placed: Vec<(u64, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |&pos| (pos, word.as_str())))
        .collect();
    // Stable sort: claims on one position stay in index order.
    placed.sort_by_key(|&(pos, _)| pos);

    placed
        .chunk_by(|a, b| a.0 == b.0)
        .filter_map(|claims| claims.last())
        .map(|&(_, word)| word)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `norm`, then cut to [`ABSTRACT_MAX_CHARS`].
pub fn normalize_abstract(raw: Option<&RawAbstract>) -> String {
    truncate_chars(norm(&abstract_text(raw)), ABSTRACT_MAX_CHARS)
}

fn truncate_chars(mut s: String, max_chars: usize) -> String {
    if let Some((byte_idx, _)) = s.char_indices().nth(max_chars) {
        s.truncate(byte_idx);
    }
    s
}
