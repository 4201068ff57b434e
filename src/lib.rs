//! Seeded Monte Carlo scenario simulator for portfolio stress analysis.
//!
//! [`core::simulate`] turns a portfolio's beta, a macro-cycle alignment score
//! and a historical stress scenario into a forward 12-month return
//! distribution. Identical requests always produce identical results.

pub mod cli;
pub mod core;
