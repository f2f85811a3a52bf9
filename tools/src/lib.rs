//! Inspection and simulation tools for inkcast.
//!
//! - Decode captured packets and summarize their structure
//! - Stream random strokes between two sessions over a lossy loopback and
//!   report what survived
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Deterministic** - A seed fully determines a simulation run.

mod inspect;
mod simulate;

pub use inspect::{format_pretty, inspect_packet, BodyReport, InspectReport, PayloadReport};
pub use simulate::{simulate, SimulateOptions, SimulationSummary, RECEIVER, SENDER};
