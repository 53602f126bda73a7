use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, Level};

use nslookup::config::{self, DEFAULT_ATTEMPTS};
use nslookup::protocol::DNS_PORT;
use nslookup::{Error, QueryKind, Resolver, ResolverConfig, Result};

#[derive(Parser, Debug)]
#[command(name = "nslookup")]
#[command(version)]
#[command(about = "Ask one DNS server for a host's A record or an IPv4 address's PTR record")]
struct Cli {
    /// Hostname to resolve, or IPv4 address for a reverse lookup
    lookup: String,

    /// IPv4 address of the DNS server
    server: String,

    /// Server port
    #[arg(long, default_value_t = DNS_PORT)]
    port: u16,

    /// Seconds to wait for each reply
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    timeout: u64,

    /// Sends before giving up
    #[arg(long, default_value_t = DEFAULT_ATTEMPTS)]
    attempts: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    config::init_logging(cli.log_level);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&cli, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(error = ?e, os_error = ?e.os_error(), "lookup failed");
            let _ = writeln!(out, "  ++ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let server: Ipv4Addr = cli.server.parse().map_err(|_| {
        Error::Config(format!(
            "address of DNS server {:?} is not a valid IPv4 address",
            cli.server
        ))
    })?;

    let config = ResolverConfig {
        port: cli.port,
        timeout: Duration::from_secs(cli.timeout),
        max_attempts: cli.attempts,
        ..ResolverConfig::default()
    };
    config.validate()?;

    let resolver = Resolver::new(server, &config)?;
    resolver.resolve(QueryKind::for_lookup(&cli.lookup), &cli.lookup, out)?;
    Ok(())
}
