//! Shared vocabulary for the tx dictionary crates.
//!
//! - [`enums`] -- Matching modes and limit constants
//! - [`matches`] -- Key identifiers and scan results

pub mod enums;
pub mod matches;

pub use enums::{PrefixMatch, effective_limit};
pub use matches::{KeyId, MapScanMatch, ScanMatch};
