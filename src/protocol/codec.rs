//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Every message is one line of UTF-8 text terminated by `\n`.
//!
//! ### Request Format
//! ```text
//! clientId|requestId|typeCode|key1=val1;key2=val2
//! ```
//! Parameter values are not escaped; they cannot contain `;`, and a key
//! ends at the first `=`.
//!
//! ### Response Format
//! ```text
//! clientId|requestId|statusCode|message|data
//! ```
//! `message` and `data` are escaped with [`escape_field`].

use std::io::{BufRead, Write};

use crate::error::{NavError, Result};
use super::{Request, RequestType, Response, Status};

/// Longest accepted line, excluding the terminator (64 KiB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

// =============================================================================
// Field Escaping
// =============================================================================

/// Escape a free-text field so it contains no `|` and no line breaks
///
/// `\` → `\\`, `|` → `\p`, LF → `\n`, CR → `\r`.
pub fn escape_field(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\p"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse of [`escape_field`]; an unknown escape is kept as written
pub fn unescape_field(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('p') => out.push('|'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request as a line (without the trailing newline)
pub fn encode_request(request: &Request) -> String {
    let params = request
        .params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(";");

    format!(
        "{}|{}|{}|{}",
        request.client_id,
        request.request_id,
        request.kind.code(),
        params
    )
}

/// Decode a request line
///
/// Unknown type codes decode to [`RequestType::Unknown`]; a line without the
/// three numeric header fields is a protocol error.
pub fn decode_request(line: &str) -> Result<Request> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields = line.splitn(4, '|');

    let client_id = parse_header_field(fields.next(), "client id", line)?;
    let request_id = parse_header_field(fields.next(), "request id", line)?;
    let type_code: i64 = parse_header_field(fields.next(), "type code", line)?;

    let mut request = Request::new(RequestType::from_code(type_code));
    request.client_id = client_id;
    request.request_id = request_id;

    if let Some(params) = fields.next() {
        for pair in params.split(';') {
            if let Some((key, value)) = pair.split_once('=') {
                request.params.insert(key.to_string(), value.to_string());
            }
        }
    }

    Ok(request)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response as a line (without the trailing newline)
pub fn encode_response(response: &Response) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        response.client_id,
        response.request_id,
        response.status.code(),
        escape_field(&response.message),
        escape_field(&response.data)
    )
}

/// Decode a response line
pub fn decode_response(line: &str) -> Result<Response> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields = line.splitn(5, '|');

    let client_id = parse_header_field(fields.next(), "client id", line)?;
    let request_id = parse_header_field(fields.next(), "request id", line)?;
    let status_code: i64 = parse_header_field(fields.next(), "status code", line)?;

    let message = fields.next().map(unescape_field).unwrap_or_default();
    let data = fields.next().map(unescape_field).unwrap_or_default();

    Ok(Response {
        client_id,
        request_id,
        status: Status::from_code(status_code),
        message,
        data,
    })
}

fn parse_header_field<T: std::str::FromStr>(field: Option<&str>, what: &str, line: &str) -> Result<T> {
    let field = field.ok_or_else(|| {
        NavError::Protocol(format!("Missing {} in '{}'", what, line))
    })?;
    field.trim().parse().map_err(|_| {
        NavError::Protocol(format!("Invalid {} '{}' in '{}'", what, field, line))
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one line, failing with `UnexpectedEof` when the stream is closed
fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 {
        return Err(NavError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed",
        )));
    }
    if line.len() > MAX_LINE_LENGTH + 2 {
        return Err(NavError::Protocol(format!(
            "Line too long: {} bytes (max {})",
            line.len(),
            MAX_LINE_LENGTH
        )));
    }
    Ok(line)
}

/// Read a complete request from a stream
///
/// Blocks until a full line is received or an error occurs
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Request> {
    decode_request(&read_line(reader)?)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    writeln!(writer, "{}", encode_request(request))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    decode_response(&read_line(reader)?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writeln!(writer, "{}", encode_response(response))?;
    writer.flush()?;
    Ok(())
}
