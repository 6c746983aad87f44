use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{PapersetError, Result};

/// Word → token positions, kept in the order the words appear in the source
/// object. Reconstruction depends on that order when positions collide.
pub type InvertedIndex = Vec<(String, Vec<u64>)>;

/// An abstract as a provider ships it: either prose or an inverted index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAbstract {
    Text(String),
    InvertedIndex(InvertedIndex),
}

impl RawAbstract {
    /// Reads a JSON `{word: [positions]}` object. Non-integer positions are
    /// skipped; anything but an object yields `None`.
    pub fn index_from_json(value: &Value) -> Option<Self> {
        parse_inverted_index(value).map(Self::InvertedIndex)
    }
}

impl Default for RawAbstract {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Serialize for RawAbstract {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::InvertedIndex(index) => {
                serializer.collect_map(index.iter().map(|(word, positions)| (word, positions)))
            }
        }
    }
}

/// One line of the raw JSONL feed.
///
/// Every field is optional on the wire. Missing or wrongly-typed values
/// collapse to their empty form instead of failing the line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    pub source: Option<String>,
    pub openalex_id: Option<String>,
    pub doi: Option<String>,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<RawAbstract>,
    pub year: Option<i64>,
    pub venue: String,
    pub fields_of_study: Vec<String>,
    pub open_access: bool,
    pub pdf_url: String,
    pub references: Vec<String>,
    pub authors: Vec<String>,
}

impl RawRecord {
    /// Parses one input line. `line_no` is 1-based and only used for errors.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Self> {
        let value: Value = serde_json::from_str(line)
            .map_err(|source| PapersetError::InvalidRecord { line: line_no, source })?;
        Self::from_json(&value).ok_or(PapersetError::NotAnObject(line_no))
    }

    /// Builds a record from an already-parsed JSON value. Returns `None` when
    /// the value is not an object.
    pub fn from_json(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;

        let abstract_text = match obj.get("abstract") {
            Some(Value::Null) | None => obj
                .get("abstract_inverted_index")
                .and_then(RawAbstract::index_from_json),
            Some(raw) => Some(parse_abstract(raw)),
        };

        Some(Self {
            source: obj.get("source").and_then(scalar_text),
            openalex_id: obj.get("openalex_id").and_then(scalar_text),
            doi: obj.get("doi").and_then(scalar_text),
            title: obj.get("title").and_then(scalar_text).unwrap_or_default(),
            abstract_text,
            year: obj.get("year").and_then(parse_year),
            venue: obj.get("venue").and_then(scalar_text).unwrap_or_default(),
            fields_of_study: text_list(obj.get("fields_of_study"), false),
            open_access: obj.get("open_access").is_some_and(truthy),
            pdf_url: obj
                .get("pdf_url")
                .or_else(|| obj.get("url_pdf"))
                .and_then(scalar_text)
                .unwrap_or_default(),
            references: text_list(obj.get("references"), false),
            authors: text_list(obj.get("authors"), true),
        })
    }

    pub fn first_author(&self) -> &str {
        self.authors.first().map(String::as_str).unwrap_or_default()
    }
}

fn parse_abstract(value: &Value) -> RawAbstract {
    match value {
        Value::Object(_) => {
            RawAbstract::InvertedIndex(parse_inverted_index(value).unwrap_or_default())
        }
        other => RawAbstract::Text(scalar_text(other).unwrap_or_default()),
    }
}

fn parse_inverted_index(value: &Value) -> Option<InvertedIndex> {
    let obj = value.as_object()?;
    Some(
        obj.iter()
            .map(|(word, positions)| {
                let positions = positions
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .filter_map(Value::as_u64)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                (word.clone(), positions)
            })
            .collect(),
    )
}

fn parse_year(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strings pass through; numbers are rendered. Everything else has no text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// With `keep_empty`, non-text entries become `""` so list positions survive.
fn text_list(value: Option<&Value>, keep_empty: bool) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|item| match scalar_text(item) {
                    Some(text) => Some(text),
                    None if keep_empty => Some(String::new()),
                    None => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(arr) => !arr.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
    }
}
