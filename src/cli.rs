//! Command-line interface.

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::KvDemoConfig;
use crate::demos::perf_strings::{DEFAULT_COUNT, MAX_COUNT};
use crate::store::{MAX_DB, MIN_DB};

/// Usage-pattern demos against a Redis-protocol key-value store.
#[derive(Debug, Parser)]
#[command(name = "kvdemos", version, about)]
pub struct Cli {
    /// Store URL, overriding the configuration
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub demo: Demo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// The demo to run.
#[derive(Debug, Subcommand)]
pub enum Demo {
    /// Sliding-window rate limiter on sorted sets
    RateLimiter {
        /// Database number (1-7)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(i64::from(MIN_DB)..=i64::from(MAX_DB)))]
        db: u8,

        /// Keep existing data in the database
        #[arg(long)]
        noflush: bool,

        /// Issue trim, count and insert as separate commands instead of a script
        #[arg(long)]
        sequential: bool,
    },

    /// String SET/DEL throughput
    PerfStrings {
        /// Database number (1-7)
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(i64::from(MIN_DB)..=i64::from(MAX_DB)))]
        db: u8,

        /// Keep existing data in the database
        #[arg(long)]
        noflush: bool,

        /// Number of key/value pairs (1-1M)
        #[arg(
            long,
            default_value_t = DEFAULT_COUNT,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_COUNT))
        )]
        n: u32,
    },

    /// Role-based permission checks on sets and strings
    RoleSecurity {
        /// Database number (1-7)
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(i64::from(MIN_DB)..=i64::from(MAX_DB)))]
        db: u8,

        /// Keep existing data in the database
        #[arg(long)]
        noflush: bool,
    },

    /// Leaderboard on sorted sets and sets
    Leaderboard {
        /// Database number (1-7)
        #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(i64::from(MIN_DB)..=i64::from(MAX_DB)))]
        db: u8,

        /// Keep existing data in the database
        #[arg(long)]
        noflush: bool,
    },
}

impl Demo {
    /// Database index the demo runs in.
    pub fn db(&self) -> u8 {
        match self {
            Demo::RateLimiter { db, .. }
            | Demo::PerfStrings { db, .. }
            | Demo::RoleSecurity { db, .. }
            | Demo::Leaderboard { db, .. } => *db,
        }
    }

    /// Whether the database is flushed before the demo runs.
    pub fn flush(&self) -> bool {
        match self {
            Demo::RateLimiter { noflush, .. }
            | Demo::PerfStrings { noflush, .. }
            | Demo::RoleSecurity { noflush, .. }
            | Demo::Leaderboard { noflush, .. } => !*noflush,
        }
    }
}

impl Cli {
    /// Fold command-line overrides into a loaded configuration.
    pub fn apply(&self, config: &mut KvDemoConfig) {
        if let Some(url) = &self.url {
            config.store.url = url.clone();
        }
        if let Demo::RateLimiter {
            sequential: true, ..
        } = self.demo
        {
            config.rate_limiting.atomic = false;
        }
    }
}
