//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem)
//! but are themselves concrete structs, not traits.

mod import;

pub use import::{ImportService, DEFAULT_RECORD_EXTENSION};
