//! Transaction and bundle ordering for block assembly.
//!
//! [`OrderBook`] merges nonce-sorted transaction queues of many senders with
//! simulated bundles and yields them highest price first, one transaction per sender
//! at a time. Prices and tie-breaks are defined by [`OrderWrapper`].

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod book;
mod error;
mod order;
mod priority;

pub use book::OrderBook;
pub use error::OrderError;
pub use order::{Order, OrderWrapper};
