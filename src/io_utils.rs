//! Reading marketplace exports from disk.
//!
//! CSV and TSV files are decoded through `encoding_rs` (UTF-8 unless told
//! otherwise) with the delimiter picked from the extension; `.json` files
//! must hold an array of flat objects. A path of `-` reads CSV from stdin.
//! Cells are kept as text; numeric coercion happens at ingestion.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::data::{RawRecord, Value};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Parsed contents of one uploaded file.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or(if has_extension(path, "tsv") {
        DEFAULT_TSV_DELIMITER
    } else {
        DEFAULT_CSV_DELIMITER
    })
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if is_dash(path) {
        Ok(Box::new(std::io::stdin().lock()))
    } else {
        Ok(Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        )))
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

/// Reads a delimited export. Rows whose cells are all blank are skipped;
/// short rows simply lack the trailing columns.
pub fn read_csv<R: Read>(reader: R, delimiter: u8, encoding: &'static Encoding) -> Result<Upload> {
    let mut reader = open_csv_reader(reader, delimiter);
    let headers = decode_record(&reader.byte_headers()?.clone(), encoding)?
        .into_iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let cells = decode_record(&record, encoding)
            .with_context(|| format!("Decoding line {line}"))?;
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(
            headers
                .iter()
                .zip(cells)
                .map(|(header, cell)| (header.clone(), Value::Text(cell)))
                .collect::<RawRecord>(),
        );
    }
    debug!("Read {} row(s) across {} column(s)", rows.len(), headers.len());
    Ok(Upload { headers, rows })
}

/// Reads a JSON array of objects; headers are the keys of the first object.
pub fn read_json(text: &str) -> Result<Upload> {
    let rows: Vec<RawRecord> =
        serde_json::from_str(text).context("Expected a JSON array of flat objects")?;
    let headers = rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();
    Ok(Upload { headers, rows })
}

/// Reads `path` as JSON when its extension says so, otherwise as CSV/TSV.
pub fn read_upload(
    path: &Path,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Upload> {
    if has_extension(path, "xlsx") || has_extension(path, "xls") {
        bail!("Spreadsheet files are not supported; export {path:?} as CSV first");
    }
    if has_extension(path, "json") {
        let mut bytes = Vec::new();
        open_input(path)?
            .read_to_end(&mut bytes)
            .with_context(|| format!("Reading {path:?}"))?;
        let text = decode_bytes(&bytes, encoding)?;
        return read_json(&text).with_context(|| format!("Parsing {path:?}"));
    }
    let delimiter = resolve_input_delimiter(path, delimiter);
    read_csv(open_input(path)?, delimiter, encoding).with_context(|| format!("Reading {path:?}"))
}
