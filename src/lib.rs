#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
mod macros;

/// Bundle construction and transaction signing.
pub mod bundle;

/// Chain reads used while signing and resolving bundles.
pub mod chain;

/// Submitter configuration.
pub mod config;

/// Constants used by the submitter.
pub mod constants;

/// Ordered RPC endpoint failover.
pub mod provider;

/// Relay client and wire types.
pub mod relay;

/// Simulation, submission, resolution and stats tasks.
pub mod tasks;

/// Test utilities.
pub mod test_utils;

/// Unit conversions and parsing helpers.
pub mod utils;

use openssl as _;
