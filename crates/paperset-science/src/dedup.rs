use std::collections::{HashMap, HashSet};

use paperset_core::PaperRow;

/// Two rows with the same key are the same logical paper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    /// The DOI when present, otherwise the lowercased normalized title.
    pub basis: String,
    pub year: Option<i64>,
}

impl DedupKey {
    pub fn of(row: &PaperRow) -> Self {
        let basis = if row.doi.is_empty() {
            row.title.to_lowercase()
        } else {
            row.doi.clone()
        };
        Self {
            basis,
            year: row.year,
        }
    }
}

/// One point for a non-empty abstract, one for a non-empty DOI.
pub fn completeness_score(row: &PaperRow) -> u8 {
    u8::from(!row.abstract_text.is_empty()) + u8::from(!row.doi.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First row seen for its key.
    Inserted,
    /// Beat the stored row on completeness and took its place.
    Replaced { previous_pid: String },
    /// Lost (or tied) against the stored row and was discarded.
    Kept { survivor_pid: String },
}

/// Surviving paper rows, one per [`DedupKey`], in first-seen key order.
#[derive(Debug, Clone, Default)]
pub struct PaperTable {
    index: HashMap<DedupKey, usize>,
    rows: Vec<PaperRow>,
}

impl PaperTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a row. It replaces the stored duplicate only on a strictly higher
    /// completeness score; ties keep the earlier row.
    pub fn offer(&mut self, row: PaperRow) -> MergeOutcome {
        let key = DedupKey::of(&row);
        match self.index.get(&key) {
            None => {
                self.index.insert(key, self.rows.len());
                self.rows.push(row);
                MergeOutcome::Inserted
            }
            Some(&slot) => {
                let stored = &mut self.rows[slot];
                if completeness_score(&row) > completeness_score(stored) {
                    let previous = std::mem::replace(stored, row);
                    MergeOutcome::Replaced {
                        previous_pid: previous.pid,
                    }
                } else {
                    MergeOutcome::Kept {
                        survivor_pid: stored.pid.clone(),
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[PaperRow] {
        &self.rows
    }

    pub fn surviving_pids(&self) -> HashSet<&str> {
        self.rows.iter().map(|row| row.pid.as_str()).collect()
    }

    pub fn into_rows(self) -> Vec<PaperRow> {
        self.rows
    }
}
