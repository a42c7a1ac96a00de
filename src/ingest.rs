use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{PulseError, Result};
use crate::headers::{missing_required, normalize_keys, record_from_row};
use crate::models::Record;

const MOCK_RESPONSES: &str = include_str!("../data/mock_responses.json");

/// Where a record collection comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Published spreadsheet exported as CSV.
    SheetUrl(String),
    CsvFile(PathBuf),
    /// JSON upload: an array of objects with the required survey fields.
    Upload(PathBuf),
    Mock,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::SheetUrl(url) => write!(f, "sheet {url}"),
            DataSource::CsvFile(path) => write!(f, "CSV file {}", path.display()),
            DataSource::Upload(path) => write!(f, "upload {}", path.display()),
            DataSource::Mock => write!(f, "bundled mock data"),
        }
    }
}

impl DataSource {
    pub async fn load(&self, client: &reqwest::Client) -> Result<Vec<Record>> {
        let records = match self {
            DataSource::SheetUrl(url) => fetch_csv(client, url).await?,
            DataSource::CsvFile(path) => parse_csv(std::fs::File::open(path)?)?,
            DataSource::Upload(path) => load_upload(path)?,
            DataSource::Mock => mock_records()?,
        };
        info!(source = %self, records = records.len(), "records loaded");
        Ok(records)
    }
}

pub async fn fetch_csv(client: &reqwest::Client, url: &str) -> Result<Vec<Record>> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| PulseError::Fetch(format!("failed to download sheet: {e}")))?;
    let body = response
        .text()
        .await
        .map_err(|e| PulseError::Fetch(format!("failed to read sheet body: {e}")))?;
    parse_csv(body.as_bytes())
}

/// Parses a CSV export with a header row. Header whitespace is trimmed and
/// rows whose cells are all blank are skipped.
pub fn parse_csv(source: impl Read) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for result in reader.records() {
        let row = result?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let pairs = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.to_string(), cell.to_string()));
        records.push(record_from_row(&normalize_keys(pairs)));
    }

    Ok(records)
}

pub fn load_upload(path: &Path) -> Result<Vec<Record>> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(PulseError::Format(
            "please select a valid JSON file".to_string(),
        ));
    }
    let text = std::fs::read_to_string(path)?;
    parse_upload(&text)
}

/// Validates the whole upload before building any record: one bad object
/// rejects the file.
pub fn parse_upload(text: &str) -> Result<Vec<Record>> {
    let document: Value = serde_json::from_str(text)?;
    let Value::Array(items) = document else {
        return Err(PulseError::Format(
            "expected an array of response objects".to_string(),
        ));
    };

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(object) = item else {
            return Err(PulseError::Format(format!(
                "entry {index} is not an object"
            )));
        };
        let row = normalize_keys(
            object
                .into_iter()
                .map(|(key, value)| (key, cell_text(value))),
        );
        let missing = missing_required(&row);
        if !missing.is_empty() {
            warn!(index, ?missing, "upload rejected");
            return Err(PulseError::Format(format!(
                "entry {index} is missing required fields: {}",
                missing.join(", ")
            )));
        }
        rows.push(row);
    }

    Ok(rows.iter().map(record_from_row).collect())
}

pub fn mock_records() -> Result<Vec<Record>> {
    parse_upload(MOCK_RESPONSES)
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}
