use core::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use noeq::{DEFAULT_MAX_SPIN, WorkerId};

use crate::{Clock, Sequencer};

/// Runtime configuration for the `noeq-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first), with defaults suitable for a single-instance
/// deployment.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "noeq-server",
    version,
    about = "A TCP service handing out float-safe 53-bit IDs"
)]
pub struct CliArgs {
    /// Worker ID embedded in every ID (0-15).
    ///
    /// Must be unique across every instance sharing an ID namespace; nothing
    /// else keeps IDs from two instances apart.
    ///
    /// Environment variable: `WORKER_ID`
    #[arg(short, long, env = "WORKER_ID", default_value_t = 0)]
    pub worker_id: u64,

    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "0.0.0.0:4444" or "/tmp/noeq.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(short = 'l', long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:4444"))]
    pub server_addr: String,

    /// Last timestamp issued by a previous run, in milliseconds since the
    /// UNIX epoch.
    ///
    /// The server refuses to mint while the clock reads earlier than this.
    ///
    /// Environment variable: `LAST_TIMESTAMP`
    #[arg(short = 't', long, env = "LAST_TIMESTAMP")]
    pub last_timestamp: Option<u64>,

    /// How long a request may wait, in milliseconds, for the clock to leave a
    /// millisecond whose sequence is exhausted.
    ///
    /// Environment variable: `MAX_SPIN_MS`
    #[arg(long, env = "MAX_SPIN_MS", default_value_t = DEFAULT_MAX_SPIN.as_millis() as u64)]
    pub max_spin_ms: u64,

    /// Seconds to wait for open connections to drain on shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub worker_id: WorkerId,
    pub server_addr: String,
    pub last_timestamp: Option<u64>,
    pub max_spin: Duration,
    pub shutdown_timeout: Duration,
    pub uds: bool,
}

impl ServerConfig {
    /// Builds the sequencer shared by every connection.
    pub fn sequencer(&self) -> Sequencer {
        let sequencer = Sequencer::new(self.worker_id, Clock::default()).with_max_spin(self.max_spin);
        match self.last_timestamp {
            Some(last) => sequencer.with_last_timestamp(last),
            None => sequencer,
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let worker_id = WorkerId::try_from(args.worker_id).context("invalid WORKER_ID")?;

        if args.max_spin_ms == 0 {
            bail!("MAX_SPIN_MS must be greater than 0");
        }

        if args.server_addr.is_empty() {
            bail!("SERVER_ADDR must not be empty");
        }

        Ok(Self {
            worker_id,
            server_addr: args.server_addr,
            last_timestamp: args.last_timestamp,
            max_spin: Duration::from_millis(args.max_spin_ms),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            uds: args.uds,
        })
    }
}
