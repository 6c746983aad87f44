use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use paperset_core::config::FetchConfig;
use paperset_core::{RawAbstract, RawRecord};
use reqwest::Url;
use serde_json::Value;

use crate::error::{Result, ScienceError};
use crate::http::RateLimitedClient;

const SOURCE_NAME: &str = "openalex";
const DOI_URL_PREFIX: &str = "https://doi.org/";
const MAX_FIELDS_OF_STUDY: usize = 5;

/// Pages OpenAlex `/works` searches and turns each hit into a [`RawRecord`].
pub struct OpenAlexFetcher {
    client: RateLimitedClient,
    base_url: String,
    per_page: u32,
    pages: u32,
    mailto: Option<String>,
}

impl OpenAlexFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mailto = Some(config.mailto.trim().to_string()).filter(|m| !m.is_empty());
        let user_agent = match &mailto {
            Some(email) => format!("paperset/{} (mailto:{email})", env!("CARGO_PKG_VERSION")),
            None => format!("paperset/{}", env!("CARGO_PKG_VERSION")),
        };
        Ok(Self {
            client: RateLimitedClient::new(
                Duration::from_millis(config.min_interval_ms),
                config.max_retries,
                &user_agent,
            )?,
            base_url: config.base_url.clone(),
            per_page: config.per_page.clamp(1, 200),
            pages: config.pages,
            mailto,
        })
    }

    fn works_url(&self, query: &str, page: u32) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ScienceError::Parse(format!("invalid URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ScienceError::Parse("invalid OpenAlex base URL".to_string()))?
            .pop_if_empty()
            .push("works");
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("search", query)
                .append_pair("per-page", &self.per_page.to_string())
                .append_pair("page", &page.to_string());
            if let Some(mailto) = &self.mailto {
                pairs.append_pair("mailto", mailto);
            }
        }
        Ok(url)
    }

    /// One page of search results.
    pub async fn fetch_page(&self, query: &str, page: u32) -> Result<Vec<RawRecord>> {
        let url = self.works_url(query, page)?;
        let json: Value = self.client.get_json(url.as_str()).await?;
        Ok(json
            .get("results")
            .and_then(Value::as_array)
            .map(|results| results.iter().map(record_from_work).collect())
            .unwrap_or_default())
    }

    /// Fetch every configured page of every query into `out` as JSONL,
    /// replacing whatever was there. Returns the number of records written.
    pub async fn fetch_to_path(&self, queries: &[String], out: &Path) -> Result<usize> {
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(out)?);
        let mut written = 0usize;

        for query in queries {
            for page in 1..=self.pages {
                let records = self.fetch_page(query, page).await?;
                tracing::info!(query = %query, page, records = records.len(), "fetched page");
                for record in &records {
                    serde_json::to_writer(&mut writer, record)
                        .map_err(|e| ScienceError::Parse(e.to_string()))?;
                    writer.write_all(b"\n")?;
                }
                written += records.len();
            }
        }

        writer.flush()?;
        tracing::info!(path = %out.display(), records = written, "raw feed written");
        Ok(written)
    }
}

/// Map one OpenAlex work object onto the raw record layout.
pub fn record_from_work(work: &Value) -> RawRecord {
    let openalex_id = str_at(work, &["id"]).map(last_segment).unwrap_or_default();
    let doi = str_at(work, &["doi"])
        .map(|doi| doi.to_lowercase().replace(DOI_URL_PREFIX, ""))
        .unwrap_or_default();

    let abstract_text = match work.get("abstract") {
        Some(Value::String(text)) if !text.is_empty() => RawAbstract::Text(text.clone()),
        _ => work
            .get("abstract_inverted_index")
            .filter(|index| index.as_object().is_some_and(|obj| !obj.is_empty()))
            .and_then(RawAbstract::index_from_json)
            .unwrap_or_default(),
    };

    let venue = str_at(work, &["host_venue", "display_name"])
        .or_else(|| str_at(work, &["primary_location", "source", "display_name"]))
        .unwrap_or_default()
        .to_string();

    let fields_of_study = array_at(work, "concepts")
        .iter()
        .take(MAX_FIELDS_OF_STUDY)
        .filter_map(|concept| str_at(concept, &["display_name"]))
        .map(ToOwned::to_owned)
        .collect();

    let references = array_at(work, "referenced_works")
        .iter()
        .filter_map(Value::as_str)
        .map(last_segment)
        .collect();

    let authors = array_at(work, "authorships")
        .iter()
        .map(|authorship| {
            str_at(authorship, &["author", "display_name"])
                .unwrap_or_default()
                .to_string()
        })
        .collect();

    RawRecord {
        source: Some(SOURCE_NAME.to_string()),
        openalex_id: Some(openalex_id),
        doi: Some(doi),
        title: str_at(work, &["title"]).unwrap_or_default().to_string(),
        abstract_text: Some(abstract_text),
        year: work.get("publication_year").and_then(Value::as_i64),
        venue,
        fields_of_study,
        open_access: work
            .get("open_access")
            .and_then(|oa| oa.get("is_oa"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        pdf_url: str_at(work, &["primary_location", "pdf_url"])
            .unwrap_or_default()
            .to_string(),
        references,
        authors,
    }
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |node, key| node.get(*key))
        .and_then(Value::as_str)
}

fn array_at<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn last_segment(id: &str) -> String {
    id.rsplit('/').next().unwrap_or(id).to_string()
}
