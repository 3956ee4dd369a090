// This module holds the infrastructure every unit shares. It has the error types and
// diagnostics that builder calls and allocation passes report through. It also has the
// signal registry. That is the declaration-ordered table of named signals whose
// write-once resource binding the allocator fills in. Both are independent of the
// particular hardware unit being mapped. The ALU and the standalone condition-logic block
// each own a registry and report through the same diagnostics.

//! Core infrastructure for resource binding.
//!
//! # Key Components
//!
//! ## Errors (`error`)
//! - [`AluError`] with a coarse [`ErrorKind`] for every failure
//! - [`Diagnostic`]s that carry the caller's [`SourceLocation`]
//!
//! ## Signals (`signal`)
//! - Declaration-ordered [`SignalRegistry`]
//! - Bit-slices, v-bits and delayed signals that refer back to their base
//! - Write-once resource bindings

pub mod error;
pub mod signal;

pub use error::{
    AluError,
    CompileResult,
    Diagnostic,
    Diagnostics,
    ErrorKind,
    PoolKind,
    SourceLocation,
};

pub use signal::{
    Behavior,
    DataType,
    Direction,
    Signal,
    SignalId,
    SignalRegistry,
};
