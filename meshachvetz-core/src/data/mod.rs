//! Roster ingestion: reading a CSV file into a validated, imputed
//! [`crate::domain::SchoolData`].

mod loader;

pub use loader::{load_csv, ImputationSummary, LoadedRoster};
