pub mod errors;
pub mod listen;
pub mod logging;
pub mod resolve;
pub mod root;
pub mod server;

pub use errors::ConfigError;
pub use listen::{ListenAddr, DISABLED_SENTINEL};
pub use logging::LoggingConfig;
pub use resolve::ResolveConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
