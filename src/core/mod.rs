//! Core types, configuration, numbering and retry.
//!
//! This module provides the order model consumed by the assembler, the
//! invoice payload it produces, and the collaborator contracts around it.

mod builder;
mod collaborators;
mod config;
pub mod countries;
mod error;
mod numbering;
mod payload;
mod retry;
mod types;

pub use builder::*;
pub use collaborators::*;
pub use config::*;
pub use error::*;
pub use numbering::*;
pub use payload::*;
pub use retry::*;
pub use types::*;
