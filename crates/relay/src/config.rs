//! Relay configuration.

use std::time::Duration;

/// Slots per beacon chain epoch on mainnet.
pub const DEFAULT_SLOTS_PER_EPOCH: u64 = 32;

/// Fetch retries for a resynchronisation triggered by a slot lookup.
pub const DEFAULT_SYNC_RETRIES: usize = 1;

/// Fetch retries for the initial synchronisation.
pub const STARTUP_SYNC_RETRIES: usize = 3;

/// Default pause between fetch attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Default timeout of a single relay request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

const VALIDATORS_PATH: &str = "/relay/v1/builder/validators";
const BLOCKS_PATH: &str = "/relay/v1/builder/blocks";

/// Body encoding of block submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionEncoding {
    /// JSON body.
    Json,
    /// SSZ body, optionally gzip compressed.
    Ssz {
        /// Whether the body is gzip compressed.
        gzip: bool,
    },
}

/// Remote relay settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Base URL of the relay.
    pub endpoint: String,
    /// Submit blocks SSZ encoded instead of JSON.
    pub ssz_enabled: bool,
    /// Gzip SSZ submissions.
    pub gzip_enabled: bool,
    /// Ask the relay to let later submissions for a slot replace earlier ones.
    pub cancellations_enabled: bool,
    /// Slots per epoch, the validator map is refreshed once per epoch.
    pub slots_per_epoch: u64,
    /// Fetch retries for a resynchronisation triggered by a slot lookup.
    pub sync_retries: usize,
    /// Pause between fetch attempts.
    pub retry_delay: Duration,
    /// Timeout of a single relay request.
    pub request_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            ssz_enabled: false,
            gzip_enabled: false,
            cancellations_enabled: false,
            slots_per_epoch: DEFAULT_SLOTS_PER_EPOCH,
            sync_retries: DEFAULT_SYNC_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl RelayConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), ..Default::default() }
    }

    pub fn with_ssz(mut self, enabled: bool) -> Self {
        self.ssz_enabled = enabled;
        self
    }

    pub fn with_gzip(mut self, enabled: bool) -> Self {
        self.gzip_enabled = enabled;
        self
    }

    pub fn with_cancellations(mut self, enabled: bool) -> Self {
        self.cancellations_enabled = enabled;
        self
    }

    pub fn with_slots_per_epoch(mut self, slots_per_epoch: u64) -> Self {
        self.slots_per_epoch = slots_per_epoch;
        self
    }

    pub fn with_sync_retries(mut self, retries: usize) -> Self {
        self.sync_retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Epoch of `slot`.
    pub const fn epoch(&self, slot: u64) -> u64 {
        // a zero setting would divide by zero
        let slots = if self.slots_per_epoch == 0 { 1 } else { self.slots_per_epoch };
        slot / slots
    }

    /// Validator registrations endpoint.
    pub fn validators_endpoint(&self) -> String {
        format!("{}{VALIDATORS_PATH}", self.base())
    }

    /// Block submission endpoint.
    pub fn submission_endpoint(&self) -> String {
        let mut endpoint = format!("{}{BLOCKS_PATH}", self.base());
        if self.cancellations_enabled {
            endpoint.push_str("?cancellations=1");
        }
        endpoint
    }

    /// Body encoding of block submissions. Gzip only applies to SSZ.
    pub const fn submission_encoding(&self) -> SubmissionEncoding {
        if self.ssz_enabled {
            SubmissionEncoding::Ssz { gzip: self.gzip_enabled }
        } else {
            SubmissionEncoding::Json
        }
    }

    fn base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}
