/// Inclusion resolution for submitted bundles
pub mod resolve;

/// Bundle simulation gate
pub mod simulate;

/// Relay statistics reporting
pub mod stats;

/// Multi-block submission loop
pub mod submit;
