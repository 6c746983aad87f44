pub mod release;
pub mod tables;

pub use release::stage_release;
pub use tables::{
    AUTHORS_FILE, CITATIONS_FILE, PAPERS_FILE, TABLE_FILES, read_table, write_dataset, write_table,
};
