//! Ledger access, configuration, and reporting shared by the `mpt`, `scan` and `watch`
//! binaries.

pub mod config;
pub mod ledger;
pub mod logging;
pub mod output;
