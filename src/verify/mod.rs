//! Validation and verification for manifest updates.

pub mod preflight;
pub mod rules;

pub use preflight::check_manifest;
pub use rules::validate_version;
