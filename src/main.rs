//! stackrelay server binary
//!
//! Run with: cargo run -- --host 0.0.0.0 --port 8787
//! Tenant credentials and the cookie secret come from the environment
//! (see `config` module); a `.env` file is loaded when present.

use clap::Parser;
use stackrelay::constants::DEFAULT_HTTP_PORT;

#[derive(Parser)]
#[command(name = "stackrelay", about = "Multi-tenant OAuth2 PKCE relay")]
struct Cli {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_HTTP_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Load .env as early as possible so the config snapshot sees it
    let _ = dotenvy::dotenv();

    stackrelay::init_logging();

    let cli = Cli::parse();

    let config = match stackrelay::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = stackrelay::http::start_server(config, &cli.host, cli.port).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
