//! Per-slot validator preferences cached from a relay.

use crate::{
    RelayConfig, RelayError, ValidatorData, ValidatorRegistration,
    config::STARTUP_SYNC_RETRIES, types::validators_by_slot,
};
use parking_lot::RwLock;
use std::{collections::HashMap, fmt, future::Future, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Transport that retrieves the relay's validator registrations.
pub trait ValidatorSource: Send + Sync {
    /// Fetches the registrations currently known to the relay.
    fn fetch_registrations(
        &self,
    ) -> impl Future<Output = Result<Vec<ValidatorRegistration>, RelayError>> + Send;
}

/// Local validator data that takes precedence over the relay's.
pub trait ValidatorLookup: Send + Sync {
    fn validator_for_slot(&self, slot: u64) -> Result<ValidatorData, RelayError>;
}

impl ValidatorLookup for HashMap<u64, ValidatorData> {
    fn validator_for_slot(&self, slot: u64) -> Result<ValidatorData, RelayError> {
        self.get(&slot).cloned().ok_or(RelayError::ValidatorNotFound)
    }
}

#[derive(Debug)]
struct RegistryState {
    validators: HashMap<u64, ValidatorData>,
    /// Slot of the last successful synchronisation, zero before the first one.
    last_requested_slot: u64,
    /// Number of completed synchronisations.
    generation: u64,
    last_outcome: Result<(), RelayError>,
}

/// Cache of validator registrations, refreshed once per epoch.
///
/// Synchronisations are single flight: callers that need a refresh while another one
/// is running wait for it and share its outcome.
pub struct ValidatorRegistry<F> {
    config: RelayConfig,
    source: F,
    local: Option<Arc<dyn ValidatorLookup>>,
    state: RwLock<RegistryState>,
    sync: Mutex<()>,
}

impl<F: ValidatorSource> ValidatorRegistry<F> {
    pub fn new(config: RelayConfig, source: F) -> Self {
        Self {
            config,
            source,
            local: None,
            state: RwLock::new(RegistryState {
                validators: HashMap::new(),
                last_requested_slot: 0,
                generation: 0,
                last_outcome: Ok(()),
            }),
            sync: Mutex::new(()),
        }
    }

    /// Sets local validator data that overrides the relay's.
    pub fn with_local(mut self, local: Arc<dyn ValidatorLookup>) -> Self {
        self.local = Some(local);
        self
    }

    pub const fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Performs the initial synchronisation.
    ///
    /// A failure is logged and returned. The registry stays usable and retries on the
    /// next lookup.
    pub async fn start(&self) -> Result<(), RelayError> {
        let result = self.sync(0, STARTUP_SYNC_RETRIES).await;
        if let Err(err) = &result {
            warn!(
                target: "mevbuild::relay",
                endpoint = %self.config.endpoint,
                %err,
                "Could not connect to relay, continuing anyway"
            );
        }
        result
    }

    /// Returns the preferences of the proposer of `next_slot`.
    ///
    /// `next_slot` must be the chain's next slot. The first lookup and the first
    /// lookup of every later epoch refresh the cache. Local data takes precedence.
    pub async fn validator_for_slot(&self, next_slot: u64) -> Result<ValidatorData, RelayError> {
        let needs_sync = {
            let state = self.state.read();
            state.last_requested_slot == 0 ||
                self.config.epoch(next_slot) > self.config.epoch(state.last_requested_slot)
        };
        if needs_sync {
            // a failed refresh falls back to the cached map
            let _ = self.sync(next_slot, self.config.sync_retries).await;
        }

        let cached = self.state.read().validators.get(&next_slot).cloned();

        if let Some(local) = &self.local &&
            let Ok(validator) = local.validator_for_slot(next_slot)
        {
            info!(
                target: "mevbuild::relay",
                slot = next_slot,
                fee_recipient = %validator.fee_recipient,
                "Validator registration overwritten by local data"
            );
            return Ok(validator);
        }

        cached.ok_or(RelayError::ValidatorNotFound)
    }

    /// Number of cached registrations.
    pub fn len(&self) -> usize {
        self.state.read().validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the cache with the relay's current registrations.
    async fn sync(&self, slot: u64, retries: usize) -> Result<(), RelayError> {
        let generation = self.state.read().generation;
        let _guard = self.sync.lock().await;
        {
            let state = self.state.read();
            if state.generation != generation {
                return state.last_outcome.clone();
            }
        }

        debug!(target: "mevbuild::relay", slot, "Requesting validator registrations");
        let result = self.fetch_with_retries(retries).await;

        let mut state = self.state.write();
        state.generation += 1;
        match result {
            Ok(validators) => {
                info!(
                    target: "mevbuild::relay",
                    count = validators.len(),
                    slot,
                    "Updated validators"
                );
                state.validators = validators;
                state.last_requested_slot = slot;
                state.last_outcome = Ok(());
            }
            Err(err) => {
                warn!(target: "mevbuild::relay", slot, %err, "Could not update validators");
                state.last_outcome = Err(err);
            }
        }
        state.last_outcome.clone()
    }

    async fn fetch_with_retries(
        &self,
        mut retries: usize,
    ) -> Result<HashMap<u64, ValidatorData>, RelayError> {
        loop {
            match self.fetch().await {
                Ok(validators) => return Ok(validators),
                Err(err) if retries > 0 => {
                    warn!(
                        target: "mevbuild::relay",
                        %err,
                        retries,
                        "Could not get validators from relay, retrying"
                    );
                    retries -= 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch(&self) -> Result<HashMap<u64, ValidatorData>, RelayError> {
        let registrations =
            tokio::time::timeout(self.config.request_timeout, self.source.fetch_registrations())
                .await
                .map_err(|_| RelayError::Fetch("request timed out".to_string()))??;
        Ok(validators_by_slot(registrations))
    }
}

impl<F> fmt::Debug for ValidatorRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("config", &self.config)
            .field("local", &self.local.is_some())
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}
