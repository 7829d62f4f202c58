// camchain_core/src/utils/mod.rs

pub mod geometry;
pub mod serde_helpers;
