//! alchemiscale-fah - Folding@Home compute service tooling for alchemiscale
//!
//! Settings for the compute service, logging setup and the `alchemiscale-fah`
//! command line interface built on `alchemiscale-fah-client`.

pub mod cli;
pub mod logging;
pub mod settings;
