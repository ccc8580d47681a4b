//! Deterministic, pure logic shared by the devtool commands.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod description;
pub mod ignore;
pub mod version;
pub mod workflow;
