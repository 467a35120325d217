//! Binary runner utilities
//!
//! Startup and shutdown banners for the bridge binary. The startup banner
//! states which channel is bridged and the timing policies in force; the
//! shutdown banner reports the session counters.

use hypersockets::Metrics;
use std::fmt;
use tracing::info;
use twitch_pubsub::BridgeConfig;

/// What the banner reports about a bridge run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub name: String,
    pub channel_id: String,
    pub heartbeat_interval_secs: u64,
    pub upload_attempts: u32,
    /// Inclusive jitter range between upload attempts
    pub upload_delay_secs: (u64, u64),
    pub reconnect_floor_ms: u64,
    pub reconnect_cap_secs: u64,
}

impl RunConfig {
    pub fn for_bridge(name: impl Into<String>, config: &BridgeConfig) -> Self {
        Self {
            name: name.into(),
            channel_id: config.channel_id.clone(),
            heartbeat_interval_secs: config.heartbeat.interval_secs,
            upload_attempts: config.retry.max_attempts,
            upload_delay_secs: (config.retry.min_delay_secs, config.retry.max_delay_secs),
            reconnect_floor_ms: config.reconnect.initial_delay_ms,
            reconnect_cap_secs: config.reconnect.max_delay_secs,
        }
    }

    /// One line per policy, in banner order
    pub fn policy_lines(&self) -> Vec<String> {
        let (min, max) = self.upload_delay_secs;
        vec![
            format!("Channel {}", self.channel_id),
            format!("PING every {}s", self.heartbeat_interval_secs),
            format!("Uploads: {} attempts, {}-{}s apart", self.upload_attempts, min, max),
            format!(
                "Reconnect: {}ms doubling up to {}s, unlimited",
                self.reconnect_floor_ms, self.reconnect_cap_secs
            ),
        ]
    }
}

/// Session counters reported on shutdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_received: u64,
    pub frames_sent: u64,
    pub reconnects: u64,
}

impl From<Metrics> for RunSummary {
    fn from(metrics: Metrics) -> Self {
        Self {
            frames_received: metrics.messages_received,
            frames_sent: metrics.messages_sent,
            reconnects: metrics.reconnect_count,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frames received: {} | sent: {} | reconnects: {}",
            self.frames_received, self.frames_sent, self.reconnects
        )
    }
}

/// A binary that runs one bridge session to completion
#[allow(async_fn_in_trait)]
pub trait BinaryRunner {
    /// Run until the bridge stops, returning its counters
    async fn run(&mut self) -> anyhow::Result<RunSummary>;

    fn config(&self) -> &RunConfig;

    fn print_banner(&self) {
        let config = self.config();
        info!("========================================");
        info!("Starting {}", config.name);
        for line in config.policy_lines() {
            info!("{}", line);
        }
        info!("Press Ctrl+C to stop");
        info!("========================================");
    }

    fn print_shutdown(&self, summary: Option<&RunSummary>) {
        info!("========================================");
        info!("{} stopped", self.config().name);
        if let Some(summary) = summary {
            info!("{}", summary);
        }
        info!("========================================");
    }

    /// Banner, run, shutdown banner; the run's error is passed through
    async fn execute(&mut self) -> anyhow::Result<()> {
        self.print_banner();
        match self.run().await {
            Ok(summary) => {
                self.print_shutdown(Some(&summary));
                Ok(())
            }
            Err(e) => {
                self.print_shutdown(None);
                Err(e)
            }
        }
    }
}
