use std::fs;

use paperset_core::storage::{
    AUTHORS_FILE, CITATIONS_FILE, PAPERS_FILE, read_table, stage_release, write_dataset,
};
use paperset_core::{AuthorRow, CitationRow, OrphanRows, PaperRow, PapersetError};
use paperset_science::{ABSTRACT_MAX_CHARS, ScienceError, normalize_file};
use serde_json::json;
use tempfile::TempDir;

fn write_feed(dir: &TempDir, lines: &[String]) -> std::path::PathBuf {
    let path = dir.path().join("raw").join("papers.jsonl");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

#[test]
fn feed_to_tables_to_release() {
    let dir = TempDir::new().unwrap();
    let long_abstract = "w".repeat(ABSTRACT_MAX_CHARS + 1);
    let feed = write_feed(
        &dir,
        &[
            json!({"openalex_id": "W1", "title": "Foo Bar", "year": 2020, "doi": "", "abstract": "",
                   "references": ["W123", "doi:10.1/y"], "authors": ["Ada Lovelace", "Grace Hopper"]})
            .to_string(),
            json!({"doi": "10.1/x", "title": "foo   bar", "year": 2020, "abstract": "hi"}).to_string(),
            json!({"title": "Long one", "abstract": long_abstract, "authors": ["Solo, Author"]})
                .to_string(),
        ],
    );

    let dataset = normalize_file(&feed, OrphanRows::Keep).unwrap();
    let processed = dir.path().join("processed");
    let counts = write_dataset(&processed, &dataset).unwrap();
    assert_eq!(counts.to_string(), "wrote 3 papers, 2 citations, 3 authors");

    let papers: Vec<PaperRow> = read_table(&processed.join(PAPERS_FILE)).unwrap();
    let pids: Vec<_> = papers.iter().map(|p| p.pid.as_str()).collect();
    assert_eq!(pids[..2], ["oa:W1", "doi:10.1/x"]);
    assert!(pids[2].starts_with("hash:") && pids[2].len() == "hash:".len() + 20);
    assert_eq!(papers[1].title, "foo bar");
    assert_eq!(papers[2].abstract_text.chars().count(), ABSTRACT_MAX_CHARS);
    assert_eq!(papers[2].year, None);
    assert!(papers.iter().all(|p| p.source == "openalex" && p.ingested_at.ends_with('Z')));

    let citations: Vec<CitationRow> = read_table(&processed.join(CITATIONS_FILE)).unwrap();
    assert_eq!(citations[0].dst_pid, "oa:W123");
    assert_eq!(citations[1].dst_pid, "doi:10.1/y");

    let authors: Vec<AuthorRow> = read_table(&processed.join(AUTHORS_FILE)).unwrap();
    assert_eq!(authors[2].author_name, "Solo, Author");
    assert_eq!(authors[2].position, 1);
    assert_eq!(authors[2].pid, pids[2]);

    let raw_authors = fs::read_to_string(processed.join(AUTHORS_FILE)).unwrap();
    assert!(raw_authors.contains("\"Solo, Author\""));

    let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let release = stage_release(&processed, &dir.path().join("releases"), date).unwrap();
    assert_eq!(
        fs::read(release.join(PAPERS_FILE)).unwrap(),
        fs::read(processed.join(PAPERS_FILE)).unwrap()
    );
}

#[test]
fn higher_score_survives_in_either_arrival_order() {
    let sparse = json!({"openalex_id": "W1", "title": "Same", "year": 2001}).to_string();
    let rich =
        json!({"openalex_id": "W2", "title": "same", "year": 2001, "abstract": "text"}).to_string();

    for lines in [[sparse.clone(), rich.clone()], [rich.clone(), sparse.clone()]] {
        let dir = TempDir::new().unwrap();
        let feed = write_feed(&dir, &lines);
        let dataset = normalize_file(&feed, OrphanRows::Keep).unwrap();
        assert_eq!(dataset.papers.len(), 1);
        assert_eq!(dataset.papers[0].pid, "oa:W2");
    }
}

#[test]
fn malformed_feed_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let feed = write_feed(&dir, &["{\"title\":\"fine\"}".to_string(), "not json".to_string()]);

    let err = normalize_file(&feed, OrphanRows::Keep).unwrap_err();
    assert!(matches!(
        err,
        ScienceError::Core(PapersetError::InvalidRecord { line: 2, .. })
    ));
    assert!(!dir.path().join("processed").exists());
}

#[test]
fn missing_feed_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = normalize_file(&dir.path().join("nope.jsonl"), OrphanRows::Keep).unwrap_err();
    assert!(matches!(err, ScienceError::Io(_)));
}
