use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use deviceconnect_core::{bootstrap::load_config, logging, Config, Connector, Message};

/// Open the device connect channel and keep it alive until the server
/// goes away or the process is interrupted.
#[derive(Debug, Parser)]
#[command(name = "deviceconnect", version, about)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "DEVICECONNECT_CONFIG_PATH")]
    config: Option<String>,

    /// Server origin, e.g. https://hosted.example.io
    #[arg(long)]
    server_url: Option<String>,

    /// Connect path on the server
    #[arg(long)]
    path: Option<String>,

    /// Bearer token presented in the handshake
    #[arg(long, env = "DEVICECONNECT_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(server_url) = self.server_url {
            config.connection.server_url = server_url;
        }
        if let Some(path) = self.path {
            config.connection.connect_path = path;
        }
        if let Some(token) = self.token {
            config.connection.token = token;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration, command line wins
    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config);
    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;

    // 3. Connect
    let connection = &config.connection;
    let mut conn = Connector::from(connection)
        .establish(&connection.server_url, &connection.connect_path, &connection.token)
        .await?;
    info!(endpoint = %conn.endpoint(), "Connected, waiting for server traffic");

    // 4. Read loop keeps the heartbeat cycle running
    loop {
        tokio::select! {
            received = conn.recv() => match received {
                Ok(Some(Message::Text(text))) => {
                    info!(bytes = text.len(), "Received text message");
                }
                Ok(Some(Message::Binary(data))) => {
                    info!(bytes = data.len(), "Received binary message");
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    info!("Server closed the connection");
                    return Ok(());
                }
                Err(e) => {
                    error!(error = %e, "Connection lost");
                    return Err(e.into());
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing connection");
                conn.close().await?;
                return Ok(());
            }
        }
    }
}
