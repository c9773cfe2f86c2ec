//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and talks to the
//! engine through a `CromwellRestApi` built from the global server flags.

pub mod abort;
pub mod list;
pub mod metadata;
pub mod submit;
pub mod troubleshoot;

use std::time::Duration;

use caper_core::config::{DEFAULT_HOSTNAME, DEFAULT_PORT};
use caper_core::heartbeat::{DEFAULT_HEARTBEAT_FILE, DEFAULT_HEARTBEAT_TIMEOUT_MS};
use caper_core::{ClientConfig, CromwellRestApi, ServerConfig, ServerHeartbeat};

/// Where to find the Cromwell server.
#[derive(clap::Args, Debug, Clone)]
pub struct ServerArgs {
    /// Hostname or IP address of the Cromwell server
    #[arg(long, global = true, env = "CAPER_IP", default_value = DEFAULT_HOSTNAME)]
    pub ip: String,

    /// Port of the Cromwell server
    #[arg(long, global = true, env = "CAPER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Basic auth user for the Cromwell server
    #[arg(long, global = true, env = "CAPER_HTTP_USER")]
    pub http_user: Option<String>,

    /// Basic auth password for the Cromwell server
    #[arg(long, global = true, env = "CAPER_HTTP_PASSWORD", hide_env_values = true)]
    pub http_password: Option<String>,

    /// Heartbeat file written by a running Caper server
    #[arg(long, global = true, default_value = DEFAULT_HEARTBEAT_FILE)]
    pub server_heartbeat_file: String,

    /// Ignore heartbeat files older than this (milliseconds)
    #[arg(long, global = true, default_value_t = DEFAULT_HEARTBEAT_TIMEOUT_MS)]
    pub server_heartbeat_timeout: u64,

    /// Do not look for a server heartbeat file
    #[arg(long, global = true)]
    pub no_server_heartbeat: bool,
}

impl Default for ServerArgs {
    fn default() -> Self {
        Self {
            ip: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            http_user: None,
            http_password: None,
            server_heartbeat_file: DEFAULT_HEARTBEAT_FILE.to_string(),
            server_heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT_MS,
            no_server_heartbeat: false,
        }
    }
}

impl ServerArgs {
    pub fn client_config(&self) -> ClientConfig {
        let heartbeat = (!self.no_server_heartbeat).then(|| {
            ServerHeartbeat::new(
                &self.server_heartbeat_file,
                Duration::from_millis(self.server_heartbeat_timeout),
            )
        });
        ClientConfig {
            server: ServerConfig::new(&self.ip, self.port)
                .with_auth(self.http_user.clone(), self.http_password.clone()),
            heartbeat,
        }
    }

    pub fn connect(&self) -> CromwellRestApi {
        let server = self.client_config().resolve_server();
        tracing::debug!("Connecting to Cromwell at {}", server.base_url());
        CromwellRestApi::new(server)
    }
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}
