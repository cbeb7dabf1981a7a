//! Red/blue network simulator.
//!
//! A command-line driver built on top of the simulation framework. Loads a
//! built-in scenario, schedules a scripted exchange between the red and
//! blue actors and runs it either stepped (as fast as possible up to a
//! logical deadline) or paced (in step with the wall clock through the
//! engine task).
//!
//! # Example
//!
//! ```ignore
//! use redblue_simulator::{RunMode, Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::default()
//!     .with_seed(42)
//!     .with_mode(RunMode::Stepped)
//!     .with_until(10.0);
//!
//! let simulator = Simulator::new(config)?;
//! let report = simulator.run_stepped()?;
//! report.print();
//! ```

pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod scenarios;

pub use config::{RunMode, SimulatorConfig};
pub use error::{ConfigError, SimulatorError};
pub use report::SimulationReport;
pub use runner::Simulator;
