//! taxotree: a tree of life of nested taxonomic groups.
//!
//! Groups are identified by rank and name, inherit attributes from their
//! ancestors and can be searched, edited and deleted with their descendants.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
