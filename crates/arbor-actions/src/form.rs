//! Form body decoding.

use crate::ActionError;

/// A single form field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// Plain text field.
    Text(String),
    /// Uploaded file part (multipart only).
    File {
        filename: String,
        content_type: Option<String>,
        data: Vec<u8>,
    },
}

impl FormValue {
    /// The text content, if this is a text field.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::File { .. } => None,
        }
    }
}

/// An ordered form submission.
///
/// Field order is preserved; duplicate names are allowed, as in a real form
/// post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), FormValue::Text(value.into())));
    }

    /// Append a field.
    pub fn push(&mut self, name: impl Into<String>, value: FormValue) {
        self.entries.push((name.into(), value));
    }

    /// First value for a field name.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// First text value for a field name.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FormValue::as_text)
    }

    /// All entries in submission order.
    pub fn entries(&self) -> &[(String, FormValue)] {
        &self.entries
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the form has no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    pub fn parse_urlencoded(body: &[u8]) -> Result<Self, ActionError> {
        let text = std::str::from_utf8(body)
            .map_err(|_| ActionError::DecodeFailure("form body is not valid utf-8".into()))?;
        let mut form = Self::new();
        for pair in text.split('&').filter(|p| !p.is_empty()) {
            let (name, value) = match pair.split_once('=') {
                Some((n, v)) => (percent_decode(n)?, percent_decode(v)?),
                None => (percent_decode(pair)?, String::new()),
            };
            form.push_text(name, value);
        }
        Ok(form)
    }

    /// Parse a `multipart/form-data` body with the given boundary.
    pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<Self, ActionError> {
        let delimiter = format!("--{}", boundary);
        let mut form = Self::new();

        for part in split_parts(body, delimiter.as_bytes()) {
            let (headers, content) = split_headers(part)?;
            let disposition = headers
                .iter()
                .find(|h| h.to_ascii_lowercase().starts_with("content-disposition:"))
                .ok_or_else(|| {
                    ActionError::DecodeFailure("multipart part without content-disposition".into())
                })?;
            let name = disposition_param(disposition, "name").ok_or_else(|| {
                ActionError::DecodeFailure("multipart part without field name".into())
            })?;

            match disposition_param(disposition, "filename") {
                Some(filename) => {
                    let content_type = headers
                        .iter()
                        .find(|h| h.to_ascii_lowercase().starts_with("content-type:"))
                        .map(|h| h[h.find(':').unwrap_or(0) + 1..].trim().to_string());
                    form.push(
                        name,
                        FormValue::File {
                            filename,
                            content_type,
                            data: content.to_vec(),
                        },
                    );
                }
                None => {
                    let text = std::str::from_utf8(content).map_err(|_| {
                        ActionError::DecodeFailure("multipart text field is not utf-8".into())
                    })?;
                    form.push_text(name, text);
                }
            }
        }
        Ok(form)
    }
}

/// The decoded body of a direct action request, per declared content type.
#[derive(Debug, Clone)]
pub enum ActionBody {
    /// `multipart/form-data` body.
    Form(FormData),
    /// Anything else is taken as plain text.
    Text(String),
}

impl ActionBody {
    /// Decode a direct-protocol body by content type.
    pub fn from_content_type(content_type: Option<&str>, body: &[u8]) -> Result<Self, ActionError> {
        match content_type {
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let boundary = multipart_boundary(ct)?;
                Ok(ActionBody::Form(FormData::parse_multipart(body, &boundary)?))
            }
            _ => {
                let text = String::from_utf8(body.to_vec())
                    .map_err(|_| ActionError::DecodeFailure("text body is not valid utf-8".into()))?;
                Ok(ActionBody::Text(text))
            }
        }
    }
}

/// Decode a progressive-protocol submission body by content type.
pub fn decode_submission(content_type: Option<&str>, body: &[u8]) -> Result<FormData, ActionError> {
    match content_type {
        Some(ct) if ct.starts_with("multipart/form-data") => {
            let boundary = multipart_boundary(ct)?;
            FormData::parse_multipart(body, &boundary)
        }
        _ => FormData::parse_urlencoded(body),
    }
}

fn multipart_boundary(content_type: &str) -> Result<String, ActionError> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|p| p.strip_prefix("boundary="))
        .map(|b| b.trim_matches('"').to_string())
        .ok_or_else(|| ActionError::DecodeFailure("multipart body without boundary".into()))
}

fn percent_decode(s: &str) -> Result<String, ActionError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| {
                        ActionError::DecodeFailure(format!("bad percent escape in '{}'", s))
                    })?;
                out.push(hex);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out)
        .map_err(|_| ActionError::DecodeFailure("form field is not valid utf-8".into()))
}

/// Body sections between boundary delimiters, excluding preamble, epilogue,
/// and the terminal `--` marker.
fn split_parts<'a>(body: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = body;
    // Skip everything up to the first delimiter.
    let Some(idx) = find(rest, delimiter) else {
        return parts;
    };
    rest = &rest[idx + delimiter.len()..];

    while let Some(end) = find(rest, delimiter) {
        let part = trim_crlf(&rest[..end]);
        if !part.is_empty() {
            parts.push(part);
        }
        rest = &rest[end + delimiter.len()..];
        if rest.starts_with(b"--") {
            break;
        }
    }
    parts
}

fn split_headers(part: &[u8]) -> Result<(Vec<String>, &[u8]), ActionError> {
    let Some(idx) = find(part, b"\r\n\r\n") else {
        return Err(ActionError::DecodeFailure(
            "multipart part without header terminator".into(),
        ));
    };
    let header_bytes = &part[..idx];
    let content = &part[idx + 4..];
    let headers = std::str::from_utf8(header_bytes)
        .map_err(|_| ActionError::DecodeFailure("multipart headers are not utf-8".into()))?
        .split("\r\n")
        .map(String::from)
        .collect();
    Ok((headers, content))
}

fn disposition_param(header: &str, param: &str) -> Option<String> {
    // Leading space keeps `name` from matching inside `filename`.
    let needle = format!(" {}=\"", param);
    let start = header.find(&needle)? + needle.len();
    let end = header[start..].find('"')? + start;
    Some(header[start..end].to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn trim_crlf(mut part: &[u8]) -> &[u8] {
    if part.starts_with(b"\r\n") {
        part = &part[2..];
    }
    if part.ends_with(b"\r\n") {
        part = &part[..part.len() - 2];
    }
    part
}
