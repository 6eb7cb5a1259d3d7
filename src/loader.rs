use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::http_client::{fetch_bytes, http_client};
use crate::table::{CellValue, EntrantRecord, RaceTable};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    Csv,
    Json,
}

impl DataFormat {
    /// Guess from a path or URL suffix. Unknown suffixes read as CSV.
    pub fn from_name(name: &str) -> Result<Self> {
        let lower = name.to_lowercase();
        let lower = lower.split(['?', '#']).next().unwrap_or_default();
        if lower.ends_with(".json") {
            Ok(DataFormat::Json)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Err(anyhow!(
                "excel workbooks are not supported, save the sheet as csv: {name}"
            ))
        } else {
            Ok(DataFormat::Csv)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
    Bytes,
    Unavailable,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
            DataSource::Bytes => f.write_str("(in-memory)"),
            DataSource::Unavailable => f.write_str("(no data)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Arc<RaceTable>,
    pub source: DataSource,
}

pub fn parse_table(bytes: &[u8], format: DataFormat) -> Result<RaceTable> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut table = match format {
        DataFormat::Csv => parse_csv(bytes)?,
        DataFormat::Json => parse_json(bytes)?,
    };
    table.normalize_entrant_numbers();
    Ok(table)
}

fn parse_csv(bytes: &[u8]) -> Result<RaceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);
    let columns: Vec<String> = reader
        .headers()
        .context("read csv header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read csv row {}", idx + 1))?;
        let mut row = EntrantRecord::new();
        for (col, raw) in columns.iter().zip(record.iter()) {
            row.insert(col.clone(), CellValue::from_raw(raw));
        }
        rows.push(row);
    }
    Ok(RaceTable::new(columns, rows))
}

fn parse_json(bytes: &[u8]) -> Result<RaceTable> {
    let value: Value = serde_json::from_slice(bytes).context("parse json table")?;
    let Value::Array(items) = value else {
        return Err(anyhow!("json table must be an array of row objects"));
    };

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Value::Object(obj) = item else {
            return Err(anyhow!("json row {} is not an object", idx + 1));
        };
        let mut row = EntrantRecord::new();
        for (key, cell) in obj {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
            row.insert(key.clone(), CellValue::from_json(cell));
        }
        rows.push(row);
    }
    Ok(RaceTable::new(columns, rows))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    format: DataFormat,
    digest: [u8; 32],
}

/// Memoizes parsed tables by content digest, so reloading the same file (or the
/// same bytes fetched from a URL) reuses the parsed rows.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: Mutex<HashMap<CacheKey, Arc<RaceTable>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("table cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().expect("table cache lock poisoned").clear();
    }

    pub fn load_bytes(&self, bytes: &[u8], format: DataFormat) -> Result<Arc<RaceTable>> {
        let key = CacheKey {
            format,
            digest: Sha256::digest(bytes).into(),
        };
        if let Some(hit) = self
            .entries
            .lock()
            .expect("table cache lock poisoned")
            .get(&key)
            .cloned()
        {
            debug!(rows = hit.len(), "table cache hit");
            return Ok(hit);
        }

        let table = Arc::new(parse_table(bytes, format)?);
        debug!(rows = table.len(), "table cache miss");
        self.entries
            .lock()
            .expect("table cache lock poisoned")
            .insert(key, table.clone());
        Ok(table)
    }

    pub fn load_path(&self, path: &Path) -> Result<LoadedTable> {
        let format = DataFormat::from_name(&path.to_string_lossy())?;
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let table = self
            .load_bytes(&bytes, format)
            .with_context(|| format!("parse {}", path.display()))?;
        info!(path = %path.display(), rows = table.len(), "loaded table");
        Ok(LoadedTable {
            table,
            source: DataSource::File(path.to_path_buf()),
        })
    }

    pub fn load_url(&self, url: &str, timeout_secs: u64) -> Result<LoadedTable> {
        let format = DataFormat::from_name(url)?;
        let client = http_client(timeout_secs)?;
        let bytes = fetch_bytes(client, url)?;
        let table = self
            .load_bytes(&bytes, format)
            .with_context(|| format!("parse {url}"))?;
        info!(url, rows = table.len(), "loaded table");
        Ok(LoadedTable {
            table,
            source: DataSource::Url(url.to_string()),
        })
    }

    /// Path or http(s) URL.
    pub fn load_location(&self, location: &str, timeout_secs: u64) -> Result<LoadedTable> {
        if location.starts_with("http://") || location.starts_with("https://") {
            self.load_url(location, timeout_secs)
        } else {
            self.load_path(Path::new(location))
        }
    }

    /// Try the remote sample first, then the bundled local file. Returns an empty
    /// table when neither yields rows.
    pub fn load_default(
        &self,
        url: Option<&str>,
        fallback: &Path,
        timeout_secs: u64,
    ) -> LoadedTable {
        if let Some(url) = url {
            match self.load_url(url, timeout_secs) {
                Ok(loaded) if !loaded.table.is_empty() => return loaded,
                Ok(_) => warn!(url, "remote sample is empty, trying local sample"),
                Err(err) => warn!(url, error = %err, "remote sample failed, trying local sample"),
            }
        }
        if fallback.exists() {
            match self.load_path(fallback) {
                Ok(loaded) => return loaded,
                Err(err) => warn!(path = %fallback.display(), error = %err, "local sample failed"),
            }
        }
        LoadedTable {
            table: Arc::new(RaceTable::default()),
            source: DataSource::Unavailable,
        }
    }
}
