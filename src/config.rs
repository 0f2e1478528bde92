use anyhow::bail;

use crate::store::{seed, Store};

pub const LOG_ENV: &str = "RESULTSD_LOG";
pub const SEED_ENV: &str = "RESULTSD_SEED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    Demo,
    Empty,
}

impl std::str::FromStr for Seed {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "demo" => Ok(Self::Demo),
            "empty" => Ok(Self::Empty),
            other => bail!("unknown {SEED_ENV} value: {other} (expected demo or empty)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_filter: String,
    pub seed: Seed,
}

impl Config {
    /// Reads `RESULTSD_LOG` (tracing filter, default `info`) and
    /// `RESULTSD_SEED` (`demo` or `empty`, default `demo`).
    pub fn from_env() -> anyhow::Result<Self> {
        let log_filter = std::env::var(LOG_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());
        let seed = match std::env::var(SEED_ENV) {
            Ok(v) => v.parse()?,
            Err(_) => Seed::Demo,
        };
        Ok(Self { log_filter, seed })
    }

    pub fn initial_store(&self) -> anyhow::Result<Store> {
        match self.seed {
            Seed::Demo => Ok(seed::demo()?),
            Seed::Empty => Ok(Store::empty()),
        }
    }
}
