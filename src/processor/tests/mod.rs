//! Pipeline scenario tests for the processor module
//!
//! Runs the complete pipeline over small HURDAT2 and IBTrACS fixtures and
//! checks the emitted records and QA counters.

pub mod fixtures;
