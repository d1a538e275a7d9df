use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use encoding_rs::Encoding;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};

const IN_MEMORY: &str = "<memory>";

/// A typed stage row with a fixed, documented column order.
///
/// `COLUMNS` must list the serialized field names in declaration order; it is
/// used for header-only output when a stage produces no rows and for schema
/// checks when a stage table is read back from disk.
pub trait Record: Serialize + DeserializeOwned {
    const COLUMNS: &'static [&'static str];
}

/// Dynamic string table. `None` is the single missing-value marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Option<String>>>) {
        (self.headers, self.rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn require(&self, stage: &'static str, name: &str) -> PipelineResult<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::schema(stage, name))
    }

    pub fn require_all(&self, stage: &'static str, names: &[&str]) -> PipelineResult<Vec<usize>> {
        names.iter().map(|name| self.require(stage, name)).collect()
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    pub fn rename_header(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column_index(from) {
            self.headers[idx] = to.to_string();
        }
    }

    /// Reads a CSV file, decoding it with the first encoding label that
    /// yields no malformed sequences.
    pub fn read_csv(path: &Path, encodings: &[String]) -> PipelineResult<Self> {
        let bytes = fs::read(path).map_err(|err| PipelineError::load(path, err))?;
        let text = decode_with_fallback(&bytes, encodings)
            .ok_or_else(|| {
                PipelineError::load(
                    path,
                    format!("not decodable as any of [{}]", encodings.join(", ")),
                )
            })?;
        parse_csv(&text, path)
    }

    pub fn from_csv_str(raw: &str) -> PipelineResult<Self> {
        parse_csv(raw, Path::new(IN_MEMORY))
    }

    pub fn to_csv_string(&self) -> PipelineResult<String> {
        let bytes = self
            .write_into(Vec::new())
            .map_err(|err| PipelineError::write(IN_MEMORY, err))?;
        String::from_utf8(bytes).map_err(|err| PipelineError::write(IN_MEMORY, err))
    }

    pub fn write_csv(&self, path: &Path) -> PipelineResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| PipelineError::write(parent, err))?;
        }
        let file = fs::File::create(path).map_err(|err| PipelineError::write(path, err))?;
        self.write_into(file)
            .map_err(|err| PipelineError::write(path, err))?;
        debug!(path = %path.display(), rows = self.len(), "wrote table");
        Ok(())
    }

    fn write_into<W: std::io::Write>(&self, sink: W) -> Result<W, csv::Error> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(sink);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|v| v.as_deref().unwrap_or("")))?;
        }
        writer
            .into_inner()
            .map_err(|err| csv::Error::from(err.into_error()))
    }

    pub fn from_records<T: Record>(records: &[T]) -> PipelineResult<Self> {
        if records.is_empty() {
            return Ok(Self::new(
                T::COLUMNS.iter().map(|c| c.to_string()).collect(),
            ));
        }
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        for record in records {
            writer
                .serialize(record)
                .map_err(|err| PipelineError::write(IN_MEMORY, err))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| PipelineError::write(IN_MEMORY, err.into_error()))?;
        let text = String::from_utf8(bytes).map_err(|err| PipelineError::write(IN_MEMORY, err))?;
        Self::from_csv_str(&text)
    }

    pub fn to_records<T: Record>(&self, stage: &'static str) -> PipelineResult<Vec<T>> {
        for column in T::COLUMNS {
            self.require(stage, column)?;
        }
        let headers = StringRecord::from(self.headers.clone());
        let mut out = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.iter().enumerate() {
            let record: StringRecord = row.iter().map(|v| v.as_deref().unwrap_or("")).collect();
            let decoded = record
                .deserialize::<T>(Some(&headers))
                .map_err(|err| PipelineError::Decode {
                    stage,
                    row: idx + 1,
                    reason: err.to_string(),
                })?;
            out.push(decoded);
        }
        Ok(out)
    }
}

pub fn write_records<T: Record>(records: &[T], path: &Path) -> PipelineResult<()> {
    Table::from_records(records)?.write_csv(path)
}

pub fn read_records<T: Record>(
    path: &Path,
    encodings: &[String],
    stage: &'static str,
) -> PipelineResult<Vec<T>> {
    Table::read_csv(path, encodings)?.to_records(stage)
}

fn decode_with_fallback(bytes: &[u8], labels: &[String]) -> Option<String> {
    for label in labels {
        let Some(encoding) = Encoding::for_label(label.trim().as_bytes()) else {
            warn!(label = %label, "unknown encoding label, skipping");
            continue;
        };
        let (text, used, had_errors) = encoding.decode(bytes);
        if had_errors {
            debug!(encoding = used.name(), "decode produced malformed sequences");
            continue;
        }
        if used != encoding {
            debug!(requested = encoding.name(), used = used.name(), "byte order mark override");
        }
        return Some(text.into_owned());
    }
    None
}

fn parse_csv(text: &str, origin: &Path) -> PipelineResult<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| PipelineError::load(origin, err))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| PipelineError::load(origin, err))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        None
                    } else {
                        Some(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(Table::from_rows(headers, rows))
}
