//! Client configuration.
//!
//! The engine endpoint and credentials are explicit values handed to
//! `CromwellRestApi` at construction. `ClientConfig` adds heartbeat-based
//! discovery on top: a fresh heartbeat file overrides hostname/port.

use std::time::Duration;

use crate::heartbeat::ServerHeartbeat;

pub const DEFAULT_HOSTNAME: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Where the engine listens and how to authenticate.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Hostname or IP. May carry an explicit `http://`/`https://` scheme.
    pub hostname: String,
    pub port: u16,
    /// Basic auth user (used only together with `password`)
    pub user: Option<String>,
    pub password: Option<String>,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            user: None,
            password: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_auth(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }

    pub fn base_url(&self) -> String {
        let host = self.hostname.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, self.port)
        } else {
            format!("http://{}:{}", host, self.port)
        }
    }

    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// Server settings plus optional heartbeat discovery.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub heartbeat: Option<ServerHeartbeat>,
}

impl ClientConfig {
    /// The endpoint to talk to: the heartbeat's when fresh, else the
    /// configured one. Credentials and timeout always come from `server`.
    pub fn resolve_server(&self) -> ServerConfig {
        let mut server = self.server.clone();
        if let Some((hostname, port)) = self.heartbeat.as_ref().and_then(|hb| hb.read()) {
            tracing::info!("[Config] Using server from heartbeat: {}:{}", hostname, port);
            server.hostname = hostname;
            server.port = port;
        }
        server
    }
}
