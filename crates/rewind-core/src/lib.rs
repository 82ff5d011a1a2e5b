//! Core types and traits for rewind.
//!
//! This crate provides the value types shared across the rewind workspace:
//! operation kinds, apply outcomes, undo labels, the error taxonomy and
//! configuration.

mod config;
mod error;
mod kind;
mod strings;

pub use config::{UndoConfig, UndoConfigBuilder};
pub use error::{ConfigError, InvariantViolation, ServiceError};
pub use kind::{ApplyOutcome, Direction, OperationKind};
pub use strings::{UndoStrings, plural};
