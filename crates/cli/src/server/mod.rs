pub mod fcgi;
pub mod http;
pub mod https;
pub mod supervisor;

pub use fcgi::start_fcgi_server;
pub use http::start_http_server;
pub use https::start_https_server;
pub use supervisor::run_listeners;
