//! Minimal multipart/form-data splitting.
//!
//! Just enough of RFC 7578 for GraphQL uploads: named parts, optional
//! filenames and per-part content types, raw byte payloads. Anything the
//! splitter cannot frame is a malformed request, never a server error.

use crate::error::MalformedRequest;

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    /// Payload as text; value parts are UTF-8 form fields.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    pub fn is_file(&self) -> bool {
        self.file_name.is_some()
    }
}

/// Pull the boundary parameter out of a `multipart/form-data` content type.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if key.eq_ignore_ascii_case("boundary") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

fn invalid(detail: &str) -> MalformedRequest {
    MalformedRequest::InvalidMultipart {
        detail: detail.to_string(),
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (key, value) = line.split_once(':')?;
    if key.trim().eq_ignore_ascii_case(name) {
        Some(value.trim())
    } else {
        None
    }
}

fn disposition_param(disposition: &str, key: &str) -> Option<String> {
    disposition.split(';').skip(1).find_map(|param| {
        let (k, v) = param.trim().split_once('=')?;
        if k.eq_ignore_ascii_case(key) {
            Some(v.trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Split `body` into parts along `boundary`.
pub fn parse_parts(body: &[u8], boundary: &str) -> Result<Vec<Part>, MalformedRequest> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let closer = format!("\r\n--{}", boundary).into_bytes();

    let mut parts = Vec::new();
    let mut cursor =
        find(body, &delimiter, 0).ok_or_else(|| invalid("no opening boundary"))? + delimiter.len();

    loop {
        match body.get(cursor..cursor + 2) {
            Some(b"--") => break,
            Some(b"\r\n") => cursor += 2,
            _ => return Err(invalid("malformed boundary line")),
        }

        let headers_end =
            find(body, b"\r\n\r\n", cursor).ok_or_else(|| invalid("part headers not terminated"))?;
        let header_block = String::from_utf8_lossy(&body[cursor..headers_end]);
        let data_start = headers_end + 4;
        let data_end =
            find(body, &closer, data_start).ok_or_else(|| invalid("part data not terminated"))?;

        let mut name = None;
        let mut file_name = None;
        let mut content_type = None;
        for line in header_block.lines() {
            if let Some(disposition) = header_value(line, "content-disposition") {
                name = disposition_param(disposition, "name");
                file_name = disposition_param(disposition, "filename");
            } else if let Some(value) = header_value(line, "content-type") {
                content_type = Some(value.to_string());
            }
        }
        let name = name.ok_or_else(|| invalid("part without a name"))?;

        parts.push(Part {
            name,
            file_name,
            content_type,
            data: body[data_start..data_end].to_vec(),
        });

        cursor = data_end + closer.len();
    }

    Ok(parts)
}
