// camchain_est/src/lib.rs

// The driver side of the camera-chain calibration models: file loading,
// logging setup and per-iteration batch evaluation.
pub mod batch;
pub mod config;
pub mod error;
pub mod logging;

// This prelude is for convenience for code built on top of camchain_est.
pub mod prelude;
