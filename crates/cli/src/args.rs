//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// Radicle forge adapter for Woodpecker CI.
#[derive(Debug, Parser)]
#[command(name = "radicle-woodpecker", version, about)]
pub struct Args {
    /// Base URL of the Radicle node HTTP API.
    #[arg(long = "radicle-url", env = "RADICLE_URL")]
    pub node_url: String,

    /// Public base URL of the Woodpecker server.
    #[arg(long = "woodpecker-host-url", env = "WOODPECKER_HOST_URL")]
    pub ci_url: String,

    /// Shared secret for webhook signatures. Empty disables verification.
    #[arg(
        long = "hook-secret",
        env = "RADICLE_HOOK_SECRET",
        default_value = "",
        hide_env_values = true
    )]
    pub hook_secret: String,

    /// Address the webhook and login endpoints listen on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: SocketAddr,

    /// Per-request timeout for node calls, in seconds.
    #[arg(long, env = "RADICLE_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "json")]
    pub log_format: LogFormat,

    /// OTLP gRPC endpoint; traces are exported only when set.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Args {
    /// Per-request timeout for node calls.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 5] = [
        "radicle-woodpecker",
        "--radicle-url",
        "https://seed.example.com",
        "--woodpecker-host-url",
        "https://ci.example.com",
    ];

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(REQUIRED).unwrap();

        assert_eq!(args.listen_addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(args.request_timeout(), Duration::from_secs(30));
        assert_eq!(args.log_format, LogFormat::Json);
        assert!(args.hook_secret.is_empty());
    }

    #[test]
    fn test_overrides() {
        let mut argv = REQUIRED.to_vec();
        argv.extend([
            "--hook-secret",
            "s3cret",
            "--listen-addr",
            "127.0.0.1:9000",
            "--request-timeout-secs",
            "5",
            "--log-format",
            "pretty",
        ]);

        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.hook_secret, "s3cret");
        assert_eq!(args.listen_addr.port(), 9000);
        assert_eq!(args.request_timeout(), Duration::from_secs(5));
        assert_eq!(args.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_rejects_bad_listen_addr() {
        let mut argv = REQUIRED.to_vec();
        argv.extend(["--listen-addr", "not-an-address"]);
        assert!(Args::try_parse_from(argv).is_err());
    }
}
