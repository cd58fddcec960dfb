//! Sensorpath CLI library.
//!
//! Output formatting and data-source selection shared by the
//! `sensorpath-cli` binary.

pub mod output;
pub mod sources;
