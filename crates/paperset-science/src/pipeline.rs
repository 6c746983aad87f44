//! The single-pass fold from raw JSONL records to the three output tables.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Utc};
use paperset_core::{
    AuthorRow, CitationRow, Dataset, OrphanRows, PaperRow, RawRecord, TableCounts,
};

use crate::dedup::{MergeOutcome, PaperTable};
use crate::error::Result;
use crate::identifiers::{prefix_reference, resolve_pid};
use crate::normalize::{norm, normalize_abstract};

/// Value of `source` when a record doesn't name one.
pub const DEFAULT_SOURCE: &str = "openalex";

/// Accumulates papers, citations and authors across one pass over the input.
///
/// Citation and author rows are emitted as each record is folded, before its
/// dedup fate is known, so a record that later loses a merge still leaves rows
/// keyed by its own pid. [`OrphanRows::Drop`] filters those at [`finish`].
///
/// [`finish`]: PaperFolder::finish
pub struct PaperFolder {
    papers: PaperTable,
    citations: Vec<CitationRow>,
    authors: Vec<AuthorRow>,
    orphan_rows: OrphanRows,
    clock: fn() -> DateTime<Utc>,
    records: usize,
    replaced: usize,
    discarded: usize,
}

impl PaperFolder {
    pub fn new(orphan_rows: OrphanRows) -> Self {
        Self {
            papers: PaperTable::new(),
            citations: Vec::new(),
            authors: Vec::new(),
            orphan_rows,
            clock: Utc::now,
            records: 0,
            replaced: 0,
            discarded: 0,
        }
    }

    /// Source of `ingested_at` timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Fold one record into the tables.
    pub fn fold(&mut self, record: &RawRecord) -> MergeOutcome {
        self.records += 1;
        let pid = resolve_pid(record);
        let ingested_at = format_timestamp((self.clock)());

        for reference in &record.references {
            self.citations.push(CitationRow {
                src_pid: pid.clone(),
                dst_pid: prefix_reference(reference),
            });
        }
        for (idx, name) in record.authors.iter().enumerate() {
            self.authors.push(AuthorRow::new(pid.clone(), name.clone(), idx + 1));
        }

        let outcome = self.papers.offer(paper_row(record, pid, ingested_at));
        match &outcome {
            MergeOutcome::Inserted => {}
            MergeOutcome::Replaced { previous_pid } => {
                self.replaced += 1;
                tracing::debug!(%previous_pid, record = self.records, "duplicate replaced by richer record");
            }
            MergeOutcome::Kept { survivor_pid } => {
                self.discarded += 1;
                tracing::debug!(%survivor_pid, record = self.records, "duplicate discarded");
            }
        }
        outcome
    }

    /// Parse and fold one input line. `line_no` is 1-based.
    pub fn fold_line(&mut self, line: &str, line_no: usize) -> Result<MergeOutcome> {
        let record = RawRecord::parse_line(line, line_no)?;
        Ok(self.fold(&record))
    }

    /// Fold every line of `reader`. The first bad line aborts the pass.
    pub fn fold_reader<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            self.fold_line(&line, idx + 1)?;
        }
        Ok(())
    }

    pub fn counts(&self) -> TableCounts {
        TableCounts {
            papers: self.papers.len(),
            citations: self.citations.len(),
            authors: self.authors.len(),
        }
    }

    /// Close the pass and hand back the finished tables.
    pub fn finish(self) -> Dataset {
        let Self {
            papers,
            mut citations,
            mut authors,
            orphan_rows,
            records,
            replaced,
            discarded,
            ..
        } = self;

        if orphan_rows == OrphanRows::Drop {
            let survivors = papers.surviving_pids();
            let before = citations.len() + authors.len();
            citations.retain(|row| survivors.contains(row.src_pid.as_str()));
            authors.retain(|row| survivors.contains(row.pid.as_str()));
            let dropped = before - citations.len() - authors.len();
            if dropped > 0 {
                tracing::info!(dropped, "dropped rows of superseded records");
            }
        }

        tracing::info!(records, replaced, discarded, papers = papers.len(), "fold complete");
        Dataset {
            papers: papers.into_rows(),
            citations,
            authors,
        }
    }
}

/// Normalize one record into its paper row under an already-resolved pid.
pub fn paper_row(record: &RawRecord, pid: String, ingested_at: String) -> PaperRow {
    PaperRow {
        pid,
        doi: record.doi.clone().unwrap_or_default(),
        title: norm(&record.title),
        abstract_text: normalize_abstract(record.abstract_text.as_ref()),
        year: record.year,
        venue: norm(&record.venue),
        fields_of_study: record.fields_of_study.join("|"),
        open_access: record.open_access,
        url_pdf: record.pdf_url.clone(),
        source: record
            .source
            .clone()
            .filter(|source| !source.is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        ingested_at,
    }
}

/// UTC, second precision, `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Fold a whole JSONL file.
pub fn normalize_file(input: &Path, orphan_rows: OrphanRows) -> Result<Dataset> {
    let reader = BufReader::new(File::open(input)?);
    let mut folder = PaperFolder::new(orphan_rows);
    folder.fold_reader(reader)?;
    Ok(folder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::error::ScienceError;
    use paperset_core::PapersetError;

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn folder(orphan_rows: OrphanRows) -> PaperFolder {
        PaperFolder::new(orphan_rows).with_clock(fixed_clock)
    }

    fn fold_lines(folder: &mut PaperFolder, lines: &[&str]) {
        let input = lines.join("\n");
        folder.fold_reader(input.as_bytes()).unwrap();
    }

    #[test]
    fn paper_row_normalizes_fields() {
        let line = r#"{"openalex_id":"W7","doi":"10.5/z","title":"  A \n Title ","abstract":{"b":[1],"a":[0]},"year":2019,"venue":" Some\tVenue ","fields_of_study":["ML","Vision"],"open_access":1,"pdf_url":"https://x/p.pdf","source":""}"#;
        let mut f = folder(OrphanRows::Keep);
        fold_lines(&mut f, &[line]);
        let dataset = f.finish();

        assert_eq!(
            dataset.papers,
            vec![PaperRow {
                pid: "oa:W7".to_string(),
                doi: "10.5/z".to_string(),
                title: "A Title".to_string(),
                abstract_text: "a b".to_string(),
                year: Some(2019),
                venue: "Some Venue".to_string(),
                fields_of_study: "ML|Vision".to_string(),
                open_access: true,
                url_pdf: "https://x/p.pdf".to_string(),
                source: "openalex".to_string(),
                ingested_at: "2024-05-01T12:00:00Z".to_string(),
            }]
        );
    }

    #[test]
    fn doi_and_title_keys_do_not_merge() {
        let mut f = folder(OrphanRows::Keep);
        fold_lines(
            &mut f,
            &[
                r#"{"openalex_id":"W1","title":"Foo Bar","year":2020,"doi":"","abstract":""}"#,
                r#"{"doi":"10.1/x","title":"foo   bar","year":2020,"abstract":"hi"}"#,
            ],
        );
        let dataset = f.finish();

        let pids: Vec<_> = dataset.papers.iter().map(|p| p.pid.as_str()).collect();
        assert_eq!(pids, vec!["oa:W1", "doi:10.1/x"]);
    }

    #[test]
    fn richer_duplicate_survives_with_its_own_pid() {
        let mut f = folder(OrphanRows::Keep);
        fold_lines(
            &mut f,
            &[
                r#"{"openalex_id":"W1","title":"Foo Bar","year":2020}"#,
                r#"{"openalex_id":"W2","title":"foo  BAR","year":2020,"abstract":"now with text"}"#,
            ],
        );
        let dataset = f.finish();

        assert_eq!(dataset.papers.len(), 1);
        assert_eq!(dataset.papers[0].pid, "oa:W2");
        assert_eq!(dataset.papers[0].title, "foo BAR");
    }

    #[test]
    fn citations_are_prefixed_and_keep_input_order() {
        let mut f = folder(OrphanRows::Keep);
        fold_lines(
            &mut f,
            &[
                r#"{"openalex_id":"W1","title":"A","references":["W123","doi:10.1/y","W123"]}"#,
                r#"{"openalex_id":"W2","title":"B","references":["s2:abc"]}"#,
            ],
        );
        let dataset = f.finish();

        let edges: Vec<_> = dataset
            .citations
            .iter()
            .map(|c| (c.src_pid.as_str(), c.dst_pid.as_str()))
            .collect();
        assert_eq!(
            edges,
            vec![
                ("oa:W1", "oa:W123"),
                ("oa:W1", "doi:10.1/y"),
                ("oa:W1", "oa:W123"),
                ("oa:W2", "s2:abc"),
            ]
        );
    }

    #[test]
    fn authors_are_ranked_from_one() {
        let mut f = folder(OrphanRows::Keep);
        fold_lines(&mut f, &[r#"{"doi":"10.1/a","authors":["Ada Lovelace","  Grace  Hopper "]}"#]);
        let dataset = f.finish();

        assert_eq!(
            dataset.authors,
            vec![
                AuthorRow::new("doi:10.1/a", "Ada Lovelace", 1),
                AuthorRow::new("doi:10.1/a", "  Grace  Hopper ", 2),
            ]
        );
    }

    #[test]
    fn superseded_record_rows_are_kept_by_default() {
        let lines = [
            r#"{"openalex_id":"W1","title":"Dup","year":2020,"references":["W9"],"authors":["A"]}"#,
            r#"{"openalex_id":"W2","title":"Dup","year":2020,"abstract":"x","references":["W8"],"authors":["B"]}"#,
        ];
        let mut f = folder(OrphanRows::Keep);
        fold_lines(&mut f, &lines);
        let dataset = f.finish();

        assert_eq!(dataset.papers.len(), 1);
        assert_eq!(dataset.citations.len(), 2);
        assert_eq!(dataset.citations[0].src_pid, "oa:W1");
        assert_eq!(dataset.authors.len(), 2);
    }

    #[test]
    fn drop_policy_removes_orphans() {
        let lines = [
            r#"{"openalex_id":"W1","title":"Dup","year":2020,"references":["W9"],"authors":["A"]}"#,
            r#"{"openalex_id":"W2","title":"Dup","year":2020,"abstract":"x","references":["W8"],"authors":["B"]}"#,
            r#"{"openalex_id":"W3","title":"Other","year":2020,"references":["W7"]}"#,
        ];
        let mut f = folder(OrphanRows::Drop);
        fold_lines(&mut f, &lines);
        let dataset = f.finish();

        let sources: Vec<_> = dataset.citations.iter().map(|c| c.src_pid.as_str()).collect();
        assert_eq!(sources, vec!["oa:W2", "oa:W3"]);
        assert_eq!(dataset.authors, vec![AuthorRow::new("oa:W2", "B", 1)]);
    }

    #[test]
    fn inverted_abstract_collisions_follow_document_order() {
        let mut f = folder(OrphanRows::Keep);
        f.fold_line(r#"{"title":"t","abstract":{"zeta":[0],"alpha":[0]}}"#, 1)
            .unwrap();
        assert_eq!(f.finish().papers[0].abstract_text, "alpha");
    }

    #[test]
    fn extreme_token_position_folds_without_panicking() {
        let mut f = folder(OrphanRows::Keep);
        f.fold_line(
            r#"{"title":"t","abstract":{"a":[18446744073709551615],"b":[0]}}"#,
            1,
        )
        .unwrap();
        assert_eq!(f.finish().papers[0].abstract_text, "b a");
    }

    #[test]
    fn separator_characters_collapse_in_titles() {
        let mut f = folder(OrphanRows::Keep);
        fold_lines(
            &mut f,
            &[
                r#"{"title":"Foo\u001fBar","year":2020}"#,
                r#"{"title":"foo bar","year":2020,"abstract":"x"}"#,
            ],
        );
        let dataset = f.finish();
        assert_eq!(dataset.papers.len(), 1);
        assert_eq!(dataset.papers[0].title, "foo bar");
    }

    #[test]
    fn malformed_line_aborts_with_line_number() {
        let mut f = folder(OrphanRows::Keep);
        let input = "{\"title\":\"ok\"}\n{broken\n{\"title\":\"never\"}\n";
        let err = f.fold_reader(input.as_bytes()).unwrap_err();

        assert!(matches!(
            err,
            ScienceError::Core(PapersetError::InvalidRecord { line: 2, .. })
        ));
        assert_eq!(f.counts().papers, 1);
    }

    #[test]
    fn counts_track_tables() {
        let mut f = folder(OrphanRows::Keep);
        fold_lines(&mut f, &[r#"{"doi":"10.1/a","references":["W1"],"authors":["A","B"]}"#]);
        assert_eq!(
            f.counts(),
            TableCounts {
                papers: 1,
                citations: 1,
                authors: 2
            }
        );
    }

    #[test]
    fn timestamp_format_is_second_precision_utc() {
        assert_eq!(format_timestamp(fixed_clock()), "2024-05-01T12:00:00Z");
    }
}
