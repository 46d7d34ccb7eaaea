use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ProtocolError, Result};
use crate::message::{bound_field, ImageOptions, Request};

/// Decode one request line, degrading to the zero-valued request on any
/// parse problem.
///
/// The zero request has an empty command, which the dispatcher reports as an
/// unknown command, so a malformed line still gets exactly one response.
pub fn parse_request(line: &[u8]) -> Request {
    match try_parse_request(line) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(error = %err, len = line.len(), "malformed request line");
            Request::default()
        }
    }
}

/// Decode one request line.
///
/// Missing `header`, `data` or `data.options` objects, and fields of the
/// wrong JSON type, read as zero or empty. Only invalid JSON and a
/// non-object top level are errors.
pub fn try_parse_request(line: &[u8]) -> Result<Request> {
    let root = match serde_json::from_slice::<Value>(line)? {
        Value::Object(root) => root,
        _ => return Err(ProtocolError::NotAnObject),
    };

    let mut request = Request::default();

    if let Some(header) = object_field(&root, "header") {
        request.header.version = int_field(header, "version");
        request.header.id = int_field(header, "id");
        request.header.command = string_field(header, "command");
        request.header.err = string_field(header, "err");
    }

    if let Some(options) = object_field(&root, "data").and_then(|d| object_field(d, "options")) {
        request.options = ImageOptions {
            width: int_field(options, "width"),
            height: int_field(options, "height"),
            stride: int_field(options, "stride"),
        };
    }

    Ok(request)
}

impl Request {
    /// Encode this request as one JSON line, without the trailing newline.
    pub fn to_line(&self) -> Result<Vec<u8>> {
        let line = RequestLine {
            header: HeaderLine {
                version: self.header.version,
                id: self.header.id,
                command: &self.header.command,
            },
            data: DataLine {
                options: self.options,
            },
        };
        Ok(serde_json::to_vec(&line)?)
    }
}

#[derive(Serialize)]
struct RequestLine<'a> {
    header: HeaderLine<'a>,
    data: DataLine,
}

#[derive(Serialize)]
struct HeaderLine<'a> {
    version: i64,
    id: i64,
    command: &'a str,
}

#[derive(Serialize)]
struct DataLine {
    options: ImageOptions,
}

fn object_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    obj.get(key).and_then(Value::as_object)
}

// Fractions truncate toward zero and out-of-range values saturate.
fn int_field(obj: &Map<String, Value>, key: &str) -> i64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().map_or(0, |f| f as i64)),
        _ => 0,
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => bound_field(s.clone()),
        _ => String::new(),
    }
}
