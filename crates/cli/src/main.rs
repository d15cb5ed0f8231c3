use clap::Parser;
use dohgate_api::create_doh_routes;
use dohgate_domain::CliOverrides;
use tracing::info;

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "dohgate")]
#[command(version)]
#[command(about = "dohgate - JSON DNS-over-HTTPS relay backed by the system resolver")]
#[command(
    after_help = "Queries take the form /resolve?name=example.com&type=T[&content-type=type/subtype][&pp]\n\
                  Supported types: A, NS, CNAME, PTR, MX, TXT, AAAA, SRV (by name or number)"
)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// TLS certificate file
    #[arg(long, value_name = "FILE")]
    cert: Option<String>,

    /// TLS key file
    #[arg(long, value_name = "FILE")]
    key: Option<String>,

    /// HTTP listen address, or "no" to disable
    #[arg(long, value_name = "ADDRESS")]
    http: Option<String>,

    /// HTTPS listen address, or "no" to disable
    #[arg(long, value_name = "ADDRESS")]
    https: Option<String>,

    /// FastCGI listen address (host:port or socket path), or "no" to disable
    #[arg(long, value_name = "ADDRESS")]
    fcgi: Option<String>,

    /// Remove an existing FastCGI socket before listening
    #[arg(long)]
    remove_fcgi_socket: bool,

    /// Default MIME type of responses
    #[arg(long, value_name = "MIME")]
    content_type: Option<String>,

    /// TTL reported in answers, in seconds
    #[arg(long, value_name = "SECONDS")]
    ttl: Option<u32>,

    /// Path of the resolve endpoint
    #[arg(long, value_name = "PATH")]
    endpoint: Option<String>,

    /// Per-lookup timeout in seconds (0 disables it)
    #[arg(long, value_name = "SECONDS")]
    query_timeout: Option<u64>,

    /// Log every request
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            cert: self.cert.clone(),
            key: self.key.clone(),
            http: self.http.clone(),
            https: self.https.clone(),
            fcgi: self.fcgi.clone(),
            remove_fcgi_socket: self.remove_fcgi_socket,
            content_type: self.content_type.clone(),
            ttl: self.ttl,
            endpoint: self.endpoint.clone(),
            query_timeout: self.query_timeout,
            verbose: self.verbose,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(cli.config.as_deref(), cli.overrides())?;

    bootstrap::init_logging(&config);

    info!("Starting dohgate v{}", env!("CARGO_PKG_VERSION"));
    info!(
        endpoint = %config.resolve.endpoint,
        content_type = %config.resolve.content_type,
        verbose = config.logging.verbose,
        "Request handling configured"
    );

    let app_state = di::build_app_state(&config)?;
    let router = create_doh_routes(app_state);

    server::run_listeners(&config.server, router).await?;

    info!("Server shutdown complete");
    Ok(())
}
