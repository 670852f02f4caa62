//! Relay CLI arguments.

use crate::{
    RelayConfig,
    config::{
        DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY, DEFAULT_SLOTS_PER_EPOCH,
        DEFAULT_SYNC_RETRIES,
    },
};
use clap::Args;
use std::time::Duration;

/// Remote relay arguments.
#[derive(Debug, Clone, Args)]
#[command(next_help_heading = "Relay")]
pub struct RelayArgs {
    /// Base URL of the remote relay.
    #[arg(long = "relay.endpoint", value_name = "URL")]
    pub endpoint: String,

    /// Submit blocks SSZ encoded instead of JSON.
    #[arg(long = "relay.ssz")]
    pub ssz: bool,

    /// Gzip SSZ encoded submissions.
    #[arg(long = "relay.gzip")]
    pub gzip: bool,

    /// Allow later submissions for a slot to replace earlier ones.
    #[arg(long = "relay.cancellations")]
    pub cancellations: bool,

    /// Slots per epoch. The validator map is refreshed once per epoch.
    #[arg(
        long = "relay.slots-per-epoch",
        value_name = "SLOTS",
        default_value_t = DEFAULT_SLOTS_PER_EPOCH
    )]
    pub slots_per_epoch: u64,

    /// Fetch retries when refreshing the validator map.
    #[arg(
        long = "relay.sync-retries",
        value_name = "COUNT",
        default_value_t = DEFAULT_SYNC_RETRIES
    )]
    pub sync_retries: usize,

    /// Pause between fetch attempts, in milliseconds.
    #[arg(
        long = "relay.retry-delay-ms",
        value_name = "MILLIS",
        default_value_t = DEFAULT_RETRY_DELAY.as_millis() as u64
    )]
    pub retry_delay_ms: u64,

    /// Timeout of a single relay request, in milliseconds.
    #[arg(
        long = "relay.request-timeout-ms",
        value_name = "MILLIS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT.as_millis() as u64
    )]
    pub request_timeout_ms: u64,
}

impl From<RelayArgs> for RelayConfig {
    fn from(args: RelayArgs) -> Self {
        Self::new(args.endpoint)
            .with_ssz(args.ssz)
            .with_gzip(args.gzip)
            .with_cancellations(args.cancellations)
            .with_slots_per_epoch(args.slots_per_epoch)
            .with_sync_retries(args.sync_retries)
            .with_retry_delay(Duration::from_millis(args.retry_delay_ms))
            .with_request_timeout(Duration::from_millis(args.request_timeout_ms))
    }
}
