//! Tripcheck Common Library
//!
//! Seeded selection, suite configuration and booking test data shared by the
//! tripcheck end-to-end crate.

pub mod config;
pub mod error;
pub mod rng;
pub mod test_data;

// Re-export commonly used types
pub use config::{effective_seed, AgeRange, Environment, SuiteConfig};
pub use error::{Error, Result};
pub use rng::SeededRandom;
pub use test_data::{BookingScenario, BookingSelection, PassengerSection};

/// Tripcheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
