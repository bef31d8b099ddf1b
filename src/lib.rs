//! titoctl — operational shell for the TITO/EF5 nowcasting pipeline.
//!
//! Binary discovery, config patching, archive fetch, environment bootstrap,
//! and the hourly run wrapper. The orchestrator and the EF5 hydrologic
//! engine themselves are external processes; this crate only wires them up.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod resolver;
pub mod runner;
