// Handler modules
pub mod inspect;
pub mod run;
pub mod tiers;

// Re-export all handler functions
pub use inspect::{handle_inspect, inspect_vulnerability, InspectReport, RelatedVulnerability};
pub use run::{expand_patterns, handle_run};
pub use tiers::handle_tiers;
