//! Daemon configuration, read from flags or the environment.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "updaterd", about = "Token-gated rollout trigger for a Kubernetes deployment")]
pub struct Config {
    /// Namespace of the target deployment.
    #[arg(long, env = "NAMESPACE")]
    pub namespace: String,

    /// Name of the target deployment.
    #[arg(long, env = "DEPLOYMENT")]
    pub deployment: String,

    /// Address to listen on; `:8080` binds every interface.
    #[arg(long, env = "LISTEN", default_value = ":8080", value_parser = parse_listen)]
    pub listen: SocketAddr,

    /// Shared token callers must send in the `Token` header.
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: String,

    /// Connect, read and write timeout for Kubernetes API calls.
    #[arg(long, env = "KUBE_TIMEOUT", default_value = "30s", value_parser = parse_duration)]
    pub kube_timeout: Duration,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// Reject values clap accepts but the daemon cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.namespace.trim().is_empty() {
            anyhow::bail!("namespace must not be empty");
        }
        if self.deployment.trim().is_empty() {
            anyhow::bail!("deployment must not be empty");
        }
        if self.token.is_empty() {
            anyhow::bail!("token must not be empty");
        }
        if self.kube_timeout.is_zero() {
            anyhow::bail!("kube timeout must be greater than zero");
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("namespace", &self.namespace)
            .field("deployment", &self.deployment)
            .field("listen", &self.listen)
            .field("token", &"<redacted>")
            .field("kube_timeout", &self.kube_timeout)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// Parse a listen address. A bare `:port` binds all IPv4 interfaces.
fn parse_listen(s: &str) -> Result<SocketAddr, String> {
    let s = s.trim();
    let full = if s.starts_with(':') {
        format!("0.0.0.0{s}")
    } else {
        s.to_string()
    };
    full.parse()
        .map_err(|e| format!("invalid listen address {s:?}: {e}"))
}

/// Parse `500ms`, `30s`, `2m` or a plain number of seconds.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let parsed = if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    };
    parsed.ok_or_else(|| format!("invalid duration {s:?}"))
}
