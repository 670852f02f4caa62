//! Validator registration wire types.

use crate::RelayError;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// One entry of the relay's validator registrations response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRegistration {
    #[serde(with = "decimal_u64")]
    pub slot: u64,
    pub entry: SignedRegistration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRegistration {
    pub message: RegistrationMessage,
    pub signature: String,
}

/// Validator preferences as registered with the relay.
///
/// The fee recipient is kept as received and validated when building the slot map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationMessage {
    pub fee_recipient: String,
    #[serde(with = "decimal_u64")]
    pub gas_limit: u64,
    #[serde(with = "decimal_u64")]
    pub timestamp: u64,
    pub pubkey: String,
}

/// Proposer preferences for a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorData {
    /// Lower-case hex BLS public key.
    pub pubkey: String,
    pub fee_recipient: Address,
    pub gas_limit: u64,
}

/// Parses the body of a validator registrations response.
///
/// For [`ValidatorSource`](crate::ValidatorSource) implementations.
pub fn parse_registrations(body: &[u8]) -> Result<Vec<ValidatorRegistration>, RelayError> {
    serde_json::from_slice(body).map_err(|err| RelayError::InvalidResponse(err.to_string()))
}

/// Indexes registrations by slot.
///
/// Entries with a malformed fee recipient are skipped. Later entries for the same slot
/// replace earlier ones.
pub fn validators_by_slot(
    registrations: impl IntoIterator<Item = ValidatorRegistration>,
) -> HashMap<u64, ValidatorData> {
    let mut validators = HashMap::new();
    for ValidatorRegistration { slot, entry } in registrations {
        let message = entry.message;
        let fee_recipient = match message.fee_recipient.parse::<Address>() {
            Ok(address) => address,
            Err(err) => {
                warn!(
                    target: "mevbuild::relay",
                    slot,
                    fee_recipient = %message.fee_recipient,
                    %err,
                    "Ill-formatted fee recipient from relay"
                );
                continue;
            }
        };
        validators.insert(
            slot,
            ValidatorData {
                pubkey: message.pubkey.to_lowercase(),
                fee_recipient,
                gas_limit: message.gas_limit,
            },
        );
    }
    validators
}

/// (De)serializes a `u64` as a decimal string.
mod decimal_u64 {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub(super) fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
