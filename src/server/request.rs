use std::collections::HashMap;
use std::io::Read;

use http::Method;
use may_minihttp::Request;
use tracing::{debug, warn};

use crate::context::{HeaderVec, RequestHead};
use crate::ids::RequestId;

/// One inbound HTTP request, parsed off the wire. The head is the owned
/// snapshot listeners and contexts see; the body stays raw bytes because
/// multipart payloads are binary.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub head: RequestHead,
    pub body: Vec<u8>,
}

impl IncomingRequest {
    pub fn content_type(&self) -> Option<&str> {
        self.head.header("content-type")
    }

    pub fn is_multipart(&self) -> bool {
        self.content_type()
            .map(|ct| {
                ct.get(.."multipart/form-data".len())
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/form-data"))
            })
            .unwrap_or(false)
    }
}

/// Parse query string parameters from a URL path, URL-decoding names and
/// values.
pub fn parse_query_params(path: &str) -> HashMap<String, String> {
    if let Some(pos) = path.find('?') {
        let query_str = &path[pos + 1..];
        url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    } else {
        HashMap::new()
    }
}

/// Extract an [`IncomingRequest`] from a raw `may_minihttp::Request`.
pub fn parse_request(req: Request) -> IncomingRequest {
    let method = req.method().parse::<Method>().unwrap_or(Method::GET);
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let mut headers = HeaderVec::new();
    for h in req.headers() {
        headers.push((
            h.name.to_ascii_lowercase(),
            String::from_utf8_lossy(h.value).to_string(),
        ));
    }

    let request_id = RequestId::from_header_or_new(
        headers
            .iter()
            .find(|(name, _)| name == "x-request-id")
            .map(|(_, value)| value.as_str()),
    );

    let query_params = parse_query_params(&raw_path);

    let mut body = Vec::new();
    if let Err(e) = req.body().read_to_end(&mut body) {
        warn!(request_id = %request_id, error = %e, "failed to read request body");
        body.clear();
    }

    debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        header_count = headers.len(),
        body_bytes = body.len(),
        "request parsed"
    );

    IncomingRequest {
        head: RequestHead {
            request_id,
            method,
            path,
            query_params,
            headers,
        },
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_content_type(value: &str) -> IncomingRequest {
        let mut headers = HeaderVec::new();
        headers.push(("content-type".to_string(), value.to_string()));
        IncomingRequest {
            head: RequestHead {
                request_id: RequestId::new(),
                method: Method::POST,
                path: "/graphql".to_string(),
                query_params: HashMap::new(),
                headers,
            },
            body: Vec::new(),
        }
    }

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("/graphql?query=%7B%20hero%20%7D&operationName=Hero");
        assert_eq!(q.get("query"), Some(&"{ hero }".to_string()));
        assert_eq!(q.get("operationName"), Some(&"Hero".to_string()));
        assert!(parse_query_params("/graphql").is_empty());
    }

    #[test]
    fn test_multipart_detection_ignores_parameters_and_case() {
        assert!(request_with_content_type("multipart/form-data; boundary=xyz").is_multipart());
        assert!(request_with_content_type("Multipart/Form-Data; boundary=xyz").is_multipart());
        assert!(!request_with_content_type("application/json").is_multipart());
    }
}
