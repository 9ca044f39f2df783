use may_minihttp::Response;

/// Content type of every envelope response.
pub const APPLICATION_JSON_UTF8: &str = "application/json;charset=UTF-8";

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// HTTP 200 with the serialized envelope, whatever errors it carries.
pub fn write_envelope(res: &mut Response, body: Vec<u8>) {
    res.status_code(200, "OK");
    res.header("Content-Type: application/json;charset=UTF-8");
    res.body_vec(body);
}

/// A status-only answer with an empty body. Malformed requests and
/// transport failures never get an envelope.
pub fn write_status(res: &mut Response, status: u16) {
    res.status_code(status as usize, status_reason(status));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(400), "Bad Request");
        assert_eq!(status_reason(405), "Method Not Allowed");
        assert_eq!(status_reason(500), "Internal Server Error");
    }
}
