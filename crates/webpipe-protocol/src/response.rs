use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{bound_field, ImageOptions, Response, ResponseHeader};

#[derive(Serialize, Deserialize)]
struct ResponseLine {
    header: HeaderLine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<DataLine>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct HeaderLine {
    version: i64,
    id: i64,
    err: String,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct DataLine {
    options: ImageOptions,
}

/// Encode a response as one JSON line, without the trailing newline.
///
/// `data.options` is present only when `options.width > 0`. The `err`
/// string is bounded and JSON-escaped.
pub fn format_response(response: &Response) -> Result<Vec<u8>> {
    let line = ResponseLine {
        header: HeaderLine {
            version: response.header.version,
            id: response.header.id,
            err: bound_field(response.header.err.clone()),
        },
        data: response.has_image_options().then_some(DataLine {
            options: response.options,
        }),
    };
    Ok(serde_json::to_vec(&line)?)
}

/// Decode a response line.
pub fn parse_response(line: &[u8]) -> Result<Response> {
    let line: ResponseLine = serde_json::from_slice(line)?;
    Ok(Response {
        header: ResponseHeader {
            version: line.header.version,
            id: line.header.id,
            err: line.header.err,
        },
        options: line.data.map(|d| d.options).unwrap_or_default(),
    })
}
