pub mod http_server;
pub mod multipart;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_query_params, parse_request, IncomingRequest};
pub use service::GraphQLService;
