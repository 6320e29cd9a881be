//! Log loading — parses uploaded CSV/XES bytes into an [`EventTable`].
//!
//! The loader returns a structured [`LoadError`] so callers can log the
//! real cause, while still presenting a single generic "invalid file"
//! failure to users.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::Path;

use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

use crate::model::{EventTable, TableError};

/// Synthetic column carrying the trace-level case identifier of XES logs.
pub const XES_CASE_COLUMN: &str = "case:concept:name";

/// XES attribute element tags whose key/value pairs become table columns.
const XES_ATTRIBUTE_TAGS: &[&[u8]] = &[b"string", b"date", b"int", b"float", b"boolean", b"id"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported file extension (expected .csv or .xes): {0:?}")]
    UnsupportedExtension(Option<String>),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XES parse error: {0}")]
    Xes(#[from] quick_xml::Error),

    #[error("XES attribute error: {0}")]
    XesAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Malformed table: {0}")]
    Table(#[from] TableError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse an uploaded file into the normalized event table shape.
///
/// Dispatches on the file extension, case-insensitively. Any other
/// extension or parse failure is an error; the detail is meant for the
/// server log, not the user.
pub fn load_log(file_name: &str, bytes: &[u8]) -> Result<EventTable, LoadError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => parse_csv(bytes),
        Some("xes") => parse_xes(bytes),
        _ => Err(LoadError::UnsupportedExtension(extension)),
    }
}

/// Parse delimited text with a mandatory header row. Empty cells become
/// missing values.
fn parse_csv(bytes: &[u8]) -> Result<EventTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = EventTable::new(header)?;

    for record in reader.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|cell| {
                if cell.is_empty() {
                    None
                } else {
                    Some(cell.to_string())
                }
            })
            .collect();
        table.push_row(row)?;
    }

    debug!(rows = table.len(), "parsed CSV log");
    Ok(table)
}

/// Parse an XES document by spooling the bytes to a named temp file first.
///
/// The temp file is removed when the guard drops, whether parsing
/// succeeds or fails.
fn parse_xes(bytes: &[u8]) -> Result<EventTable, LoadError> {
    let mut spool = tempfile::Builder::new()
        .prefix("tracedeck-upload-")
        .suffix(".xes")
        .tempfile()?;
    spool.write_all(bytes)?;
    spool.flush()?;

    parse_xes_file(spool.path())
}

/// One parsed `<event>`: the owning trace's case id plus its attributes.
struct XesEvent {
    case_id: Option<String>,
    attributes: Vec<(String, Option<String>)>,
}

fn parse_xes_file(path: &Path) -> Result<EventTable, LoadError> {
    let mut reader = Reader::from_file(path)?;
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut in_trace = false;
    let mut in_event = false;
    let mut trace_case: Option<String> = None;
    let mut event_attributes: Vec<(String, Option<String>)> = Vec::new();
    let mut events: Vec<XesEvent> = Vec::new();

    // Union of event attribute keys, first-encountered order; the case
    // column always leads.
    let mut columns: Vec<String> = vec![XES_CASE_COLUMN.to_string()];
    let mut column_index: HashMap<String, usize> =
        HashMap::from([(XES_CASE_COLUMN.to_string(), 0)]);

    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(ref e) => match e.local_name().as_ref() {
                b"trace" => {
                    in_trace = true;
                    trace_case = None;
                }
                b"event" => {
                    in_event = true;
                    event_attributes.clear();
                }
                tag if XES_ATTRIBUTE_TAGS.contains(&tag) => {
                    record_attribute(
                        e,
                        in_trace,
                        in_event,
                        &mut trace_case,
                        &mut event_attributes,
                        &mut columns,
                        &mut column_index,
                    )?;
                }
                _ => {}
            },
            XmlEvent::Empty(ref e) => {
                if XES_ATTRIBUTE_TAGS.contains(&e.local_name().as_ref()) {
                    record_attribute(
                        e,
                        in_trace,
                        in_event,
                        &mut trace_case,
                        &mut event_attributes,
                        &mut columns,
                        &mut column_index,
                    )?;
                }
            }
            XmlEvent::End(ref e) => match e.local_name().as_ref() {
                b"trace" => in_trace = false,
                b"event" => {
                    in_event = false;
                    events.push(XesEvent {
                        case_id: trace_case.clone(),
                        attributes: std::mem::take(&mut event_attributes),
                    });
                }
                _ => {}
            },
            XmlEvent::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let width = columns.len();
    let mut table = EventTable::new(columns)?;
    for event in events {
        let mut row = vec![None; width];
        row[0] = event.case_id;
        for (key, value) in event.attributes {
            row[column_index[&key]] = value;
        }
        table.push_row(row)?;
    }

    debug!(rows = table.len(), columns = width, "parsed XES log");
    Ok(table)
}

/// Record one XES attribute element (`<string key=.. value=../>` etc.).
///
/// Inside an event it becomes a cell of the current row; directly under a
/// trace, `concept:name` becomes the trace's case id. Log-level
/// attributes are ignored.
#[allow(clippy::too_many_arguments)]
fn record_attribute(
    element: &BytesStart<'_>,
    in_trace: bool,
    in_event: bool,
    trace_case: &mut Option<String>,
    event_attributes: &mut Vec<(String, Option<String>)>,
    columns: &mut Vec<String>,
    column_index: &mut HashMap<String, usize>,
) -> Result<(), LoadError> {
    let mut key: Option<String> = None;
    let mut value: Option<String> = None;
    for attr in element.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"key" => key = Some(attr.unescape_value()?.into_owned()),
            b"value" => value = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }

    let Some(key) = key else {
        return Ok(());
    };

    if in_event {
        if !column_index.contains_key(&key) {
            column_index.insert(key.clone(), columns.len());
            columns.push(key.clone());
        }
        event_attributes.push((key, value));
    } else if in_trace && key == "concept:name" {
        *trace_case = value;
    }

    Ok(())
}
