use serde::{Deserialize, Serialize};

pub const PAPER_COLUMNS: [&str; 11] = [
    "pid",
    "doi",
    "title",
    "abstract",
    "year",
    "venue",
    "fields_of_study",
    "open_access",
    "url_pdf",
    "source",
    "ingested_at",
];

pub const CITATION_COLUMNS: [&str; 2] = ["src_pid", "dst_pid"];

pub const AUTHOR_COLUMNS: [&str; 5] = ["pid", "author_id", "author_name", "position", "affiliation"];

/// A normalized, identity-resolved paper. Field order is column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRow {
    pub pid: String,
    pub doi: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub year: Option<i64>,
    pub venue: String,
    pub fields_of_study: String,
    pub open_access: bool,
    pub url_pdf: String,
    pub source: String,
    pub ingested_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRow {
    pub src_pid: String,
    pub dst_pid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRow {
    pub pid: String,
    /// Always empty: no author-identity resolution is performed.
    pub author_id: String,
    pub author_name: String,
    pub position: usize,
    /// Always empty.
    pub affiliation: String,
}

impl AuthorRow {
    pub fn new(pid: impl Into<String>, author_name: impl Into<String>, position: usize) -> Self {
        Self {
            pid: pid.into(),
            author_id: String::new(),
            author_name: author_name.into(),
            position,
            affiliation: String::new(),
        }
    }
}

/// The three finished tables of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub papers: Vec<PaperRow>,
    pub citations: Vec<CitationRow>,
    pub authors: Vec<AuthorRow>,
}

/// Row counts per table, as reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub papers: usize,
    pub citations: usize,
    pub authors: usize,
}

impl Dataset {
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            papers: self.papers.len(),
            citations: self.citations.len(),
            authors: self.authors.len(),
        }
    }
}

impl std::fmt::Display for TableCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "wrote {} papers, {} citations, {} authors",
            self.papers, self.citations, self.authors
        )
    }
}
