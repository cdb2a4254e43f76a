//! Core types shared by the plantops workflow designer crates.
//!
//! Provides the rootcause-backed `Result` alias and the strongly typed
//! identifiers assigned by the persistence layer.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, WorkflowId};
