// camchain_core/src/lib.rs

// This file defines the public modules of the library.
pub mod bundler;
pub mod config;
pub mod error;
pub mod estimation;
pub mod messages;
pub mod models;
pub mod params;
pub mod prelude;
pub mod test_utils;
pub mod types;
pub mod utils;
