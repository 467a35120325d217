//! Twitch PubSub bridge
//!
//! Listens to one channel's bits and subscription events and uploads them
//! to the configured PostgREST endpoint.
//!
//! Usage: `pubsub-bridge <channel_id> <auth_token>`

use anyhow::Result;
use std::sync::Arc;
use twitch_pubsub_bridge::bin_common::{
    load_config_from_env, parse_args, BinaryRunner, BridgeArgs, ConfigType, RunConfig, RunSummary,
};
use twitch_pubsub_bridge::twitch_pubsub::{
    init_tracing, BridgeConfig, HttpEventSink, LoggingTokenRefresher, PubSubBridge,
    ShutdownManager,
};

struct BridgeRunner {
    run_config: RunConfig,
    config: BridgeConfig,
}

impl BridgeRunner {
    fn new(config: BridgeConfig) -> Self {
        Self {
            run_config: RunConfig::for_bridge("Twitch PubSub Bridge", &config),
            config,
        }
    }
}

impl BinaryRunner for BridgeRunner {
    async fn run(&mut self) -> Result<RunSummary> {
        let sink = HttpEventSink::new(self.config.root_url.clone(), &self.config.api_key)?;
        let bridge = PubSubBridge::new(
            &self.config,
            Arc::new(sink),
            Arc::new(LoggingTokenRefresher),
        )?;

        let shutdown = ShutdownManager::new(bridge.handle());
        shutdown.spawn_signal_handler();

        let handle = bridge.handle();
        bridge.run().await?;
        Ok(handle.metrics().into())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = BridgeArgs::from_args(&parse_args())?;
    let config_path = load_config_from_env(ConfigType::Bridge);
    let config = BridgeConfig::load(&config_path, args.channel_id, args.auth_token)?;

    init_tracing(&config.log_level);
    config.log();

    BridgeRunner::new(config).execute().await
}
