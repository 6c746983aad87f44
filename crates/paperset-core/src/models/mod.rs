pub mod record;
pub mod rows;

pub use record::{InvertedIndex, RawAbstract, RawRecord};
pub use rows::{
    AUTHOR_COLUMNS, AuthorRow, CITATION_COLUMNS, CitationRow, Dataset, PAPER_COLUMNS, PaperRow,
    TableCounts,
};
