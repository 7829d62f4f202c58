// camchain_core/src/estimation/mod.rs

//! The optimizer-facing math that sits on top of a sensor's prediction:
//! uncertainty propagation into pixel space, whitening, and the structural
//! sparsity report.

pub mod sparsity;
pub mod uncertainty;
