//! Relay validator registry for mevbuild.
//!
//! Caches the per-slot fee recipient and gas limit preferences that proposers
//! register with a relay, refreshing them once per epoch. The HTTP transport is
//! supplied through [`ValidatorSource`].

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod args;
pub mod config;
mod error;
mod registry;
mod types;

pub use args::RelayArgs;
pub use config::{RelayConfig, SubmissionEncoding};
pub use error::{RelayError, check_status};
pub use registry::{ValidatorLookup, ValidatorRegistry, ValidatorSource};
pub use types::{
    RegistrationMessage, SignedRegistration, ValidatorData, ValidatorRegistration,
    parse_registrations, validators_by_slot,
};
