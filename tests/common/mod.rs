pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once per test binary.
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod fixture {
    use super::test_server::setup_may_runtime;
    use graphql_endpoint::engine::EchoEngine;
    use graphql_endpoint::schema::{FieldListSchema, StaticSchemaProvider};
    use graphql_endpoint::server::{GraphQLService, HttpServer, ServerHandle};
    use std::net::{SocketAddr, TcpListener};
    use std::sync::Arc;

    /// A running endpoint on a random port. Drop stops the server.
    pub struct EndpointFixture {
        pub addr: SocketAddr,
        handle: Option<ServerHandle>,
    }

    impl EndpointFixture {
        pub fn start(service: GraphQLService) -> Self {
            setup_may_runtime();
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);
            let handle = HttpServer(service).start(addr).unwrap();
            handle.wait_ready().unwrap();
            Self {
                addr,
                handle: Some(handle),
            }
        }

        /// Endpoint backed by the demo echo engine and a two-field schema.
        pub fn echo() -> Self {
            Self::start(GraphQLService::new(
                Arc::new(StaticSchemaProvider::new(demo_schema())),
                Arc::new(EchoEngine),
            ))
        }
    }

    impl Drop for EndpointFixture {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.stop();
            }
        }
    }

    pub fn demo_schema() -> FieldListSchema {
        FieldListSchema::new(
            vec!["hero".to_string(), "droid".to_string()],
            vec!["createReview".to_string()],
        )
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        send_request_bytes(addr, req.as_bytes())
    }

    pub fn send_request_bytes(addr: &SocketAddr, req: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Split a raw HTTP/1.1 response into status code, header block, and
    /// body text.
    pub fn parse_response(resp: &str) -> (u16, String, String) {
        let mut parts = resp.splitn(2, "\r\n\r\n");
        let headers = parts.next().unwrap_or("").to_string();
        let body = parts.next().unwrap_or("").to_string();
        let status = headers
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        (status, headers, body)
    }

    pub fn get(addr: &SocketAddr, path_and_query: &str) -> (u16, String, String) {
        let req = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path_and_query
        );
        parse_response(&send_request(addr, &req))
    }

    pub fn post(
        addr: &SocketAddr,
        path: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> (u16, String, String) {
        let mut req = format!(
            "POST {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: {}\r\n",
            path,
            body.len()
        );
        if let Some(ct) = content_type {
            req.push_str(&format!("Content-Type: {}\r\n", ct));
        }
        req.push_str("\r\n");
        let mut raw = req.into_bytes();
        raw.extend_from_slice(body);
        parse_response(&send_request_bytes(addr, &raw))
    }
}
