//! Resolver settings and logging setup.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Error, Result};
use crate::protocol::DNS_PORT;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Port the server is contacted on.
    pub port: u16,
    /// How long each attempt waits for a reply.
    pub timeout: Duration,
    /// Total sends before giving up, the first one included.
    pub max_attempts: u32,
    /// Local address the socket binds to.
    pub bind_addr: SocketAddr,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            port: DNS_PORT,
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_ATTEMPTS,
            bind_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Config("attempt count must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be non-zero".into()));
        }
        if self.port == 0 {
            return Err(Error::Config("server port must be non-zero".into()));
        }
        Ok(())
    }

    pub fn server_addr(&self, server: Ipv4Addr) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(server, self.port))
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides `level`.
/// Output goes to stderr so it never mixes with the lookup report.
pub fn init_logging(level: Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
