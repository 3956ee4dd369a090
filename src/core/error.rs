// This module defines the error types for the ALU resource binder using the thiserror crate.
// AluError is the main enum covering every failure the builder calls and the allocation pass
// can report: exhausted resource pools, duplicated labels/destinations/latches, unresolved
// labels and branch conditions, and declaration mistakes such as binding a signal of the
// wrong data type. Each variant carries the signal, label or pool involved so the message
// reads well on its own. ErrorKind groups the variants into the five categories callers
// branch on. Diagnostic pairs an error with the caller-supplied source location, and
// Diagnostics accumulates several of them so one allocation pass can report every
// independent problem before failing.

//! Error types for ALU resource binding.
//!
//! Using thiserror for idiomatic error handling.

use std::fmt;

use thiserror::Error;

use crate::core::signal::DataType;
use crate::truth::LogicError;

/// Caller-supplied position in the source description.
///
/// Opaque to the binder: it is only carried along and printed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: Option<String>,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: Some(file.into()),
            line,
        }
    }

    /// Location with no file, only a line number.
    pub fn line(line: u32) -> Self {
        Self { file: None, line }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file, self.line),
            None if self.line > 0 => write!(f, "line {}", self.line),
            None => f.write_str("<unknown>"),
        }
    }
}

/// Resource pools of the ALU, used to name the pool in capacity errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Instructions,
    WordRegisters,
    WordInputs,
    CarryInputs,
    BranchRegisters,
    ConditionLogic,
    Constants,
    Destinations,
    Overrides,
    Latches,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PoolKind::Instructions => "instructions",
            PoolKind::WordRegisters => "word registers",
            PoolKind::WordInputs => "word inputs",
            PoolKind::CarryInputs => "carry inputs",
            PoolKind::BranchRegisters => "branch registers",
            PoolKind::ConditionLogic => "condition-logic registers",
            PoolKind::Constants => "constants",
            PoolKind::Destinations => "destinations",
            PoolKind::Overrides => "condition overrides",
            PoolKind::Latches => "latches",
        };
        f.write_str(name)
    }
}

/// Broad category of an [`AluError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A fixed-size pool or budget is exhausted.
    Capacity,
    /// Something that must be unique was given twice.
    Duplicate,
    /// A label or branch condition does not resolve.
    Resolution,
    /// A signal is undeclared or declared with the wrong type or behavior.
    Declaration,
    /// The unit was used out of order (e.g. assigned twice).
    Precondition,
}

/// Main error type for ALU resource binding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AluError {
    #[error("Too many {pool} in ALU. At most {capacity} are allowed")]
    PoolExhausted { pool: PoolKind, capacity: usize },

    #[error("Too many word registers in ALU. All constants used, and only {capacity} other registers are allowed for constant '{signal}'")]
    ConstantSpill { signal: String, capacity: usize },

    #[error("Too many word inputs in ALU. Cannot provide constant input '{signal}'. At most {capacity} word inputs are allowed")]
    ConstantInput { signal: String, capacity: usize },

    #[error("Only {budget} nearest-neighbor word regs are available, but {} are non-zero, use warm_reset, or use bit-slices: {}", .registers.len(), .registers.join(", "))]
    NearestNeighborBudget { budget: usize, registers: Vec<String> },

    #[error("{slot} already declared in ALU. Only 1 {slot} is allowed")]
    SlotOccupied { slot: &'static str, signal: String },

    #[error(transparent)]
    Logic(#[from] LogicError),

    #[error("Multiple instructions with label '{label}'")]
    DuplicateLabel { label: String },

    #[error("Destination register '{signal}' repeated in instruction")]
    DuplicateDestination { signal: String },

    #[error("Signal '{signal}' latched more than once in instruction")]
    DuplicateLatch { signal: String },

    #[error("Condition register '{signal}' overridden more than once in instruction")]
    DuplicateOverride { signal: String },

    #[error("Signal '{name}' is already declared")]
    DuplicateSignal { name: String },

    #[error("Cannot perform multiple operations in one instruction slot")]
    OperationAlreadySet,

    #[error("Branch destination already set for instruction")]
    BranchAlreadySet,

    #[error("{flag} has already been set in this instruction")]
    FlagAlreadySet { flag: &'static str },

    #[error("Instruction label '{label}' not found")]
    UnknownLabel { label: String },

    #[error("Instruction {instruction} uses an unassigned branch condition '{signal}'")]
    UnassignedBranchCondition { instruction: usize, signal: String },

    #[error("Unknown ALU operation '{name}' with {arity} argument(s)")]
    UnknownOperation { name: String, arity: usize },

    #[error("Illegal signal used in latch '{signal}'. Only word_in signals may be latched")]
    IllegalLatchTarget { signal: String },

    #[error("Signal '{signal}' is not declared in unit '{unit}'")]
    UndeclaredSignal { signal: String, unit: String },

    #[error("Signal '{signal}' must be declared as a {expected}")]
    WrongDataType { signal: String, expected: DataType },

    #[error("Signal '{signal}' must be declared as {expected}")]
    WrongBehavior { signal: String, expected: &'static str },

    #[error("Signal '{signal}' has already been assigned a resource")]
    AlreadyBound { signal: String },

    #[error("Argument {position} of '{operation}' {reason}")]
    InvalidOperand {
        operation: String,
        position: usize,
        reason: &'static str,
    },

    #[error("Branch condition must be a simple expression of one branch register")]
    ComplexBranchCondition,

    #[error("Illegal bit-slice of signal '{signal}'. Can only use bits 0 to 3 of a local word reg")]
    IllegalBitSlice { signal: String },

    #[error("Illegal reference to v-bit of '{signal}'")]
    IllegalVBit { signal: String },

    #[error("Cannot delay signal '{signal}' by {delay}. Delay must be a value from 1 to {max}")]
    IllegalDelay { signal: String, delay: u32, max: u32 },

    #[error("Resources for unit '{unit}' have already been assigned")]
    AlreadyAssigned { unit: String },

    #[error("Invalid ALU limits: {reason}")]
    InvalidLimits { reason: String },
}

impl AluError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AluError::PoolExhausted { .. }
            | AluError::ConstantSpill { .. }
            | AluError::ConstantInput { .. }
            | AluError::NearestNeighborBudget { .. }
            | AluError::SlotOccupied { .. }
            | AluError::Logic(_) => ErrorKind::Capacity,

            AluError::DuplicateLabel { .. }
            | AluError::DuplicateDestination { .. }
            | AluError::DuplicateLatch { .. }
            | AluError::DuplicateOverride { .. }
            | AluError::DuplicateSignal { .. }
            | AluError::OperationAlreadySet
            | AluError::BranchAlreadySet
            | AluError::FlagAlreadySet { .. } => ErrorKind::Duplicate,

            AluError::UnknownLabel { .. }
            | AluError::UnassignedBranchCondition { .. }
            | AluError::UnknownOperation { .. }
            | AluError::IllegalLatchTarget { .. } => ErrorKind::Resolution,

            AluError::UndeclaredSignal { .. }
            | AluError::WrongDataType { .. }
            | AluError::WrongBehavior { .. }
            | AluError::AlreadyBound { .. }
            | AluError::InvalidOperand { .. }
            | AluError::ComplexBranchCondition
            | AluError::IllegalBitSlice { .. }
            | AluError::IllegalVBit { .. }
            | AluError::IllegalDelay { .. } => ErrorKind::Declaration,

            AluError::AlreadyAssigned { .. } | AluError::InvalidLimits { .. } => {
                ErrorKind::Precondition
            }
        }
    }

    /// Attach a source location.
    pub fn at(self, location: &SourceLocation) -> Diagnostic {
        Diagnostic {
            location: location.clone(),
            error: self,
        }
    }
}

/// An error together with where in the source it was caused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{location}: {error}")]
pub struct Diagnostic {
    pub location: SourceLocation,
    #[source]
    pub error: AluError,
}

impl Diagnostic {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Ordered collection of diagnostics from one pass.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("resource assignment failed with {} diagnostic(s)", .0.len())]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.0.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Whether any diagnostic has the given kind.
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|d| d.kind() == kind)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }

    /// `Ok(())` when nothing was reported.
    pub fn into_result(self) -> Result<(), Diagnostics> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result type alias for builder calls.
pub type CompileResult<T> = Result<T, Diagnostic>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let capacity = AluError::PoolExhausted {
            pool: PoolKind::WordRegisters,
            capacity: 9,
        };
        assert_eq!(capacity.kind(), ErrorKind::Capacity);
        assert_eq!(
            AluError::DuplicateLabel { label: "a".into() }.kind(),
            ErrorKind::Duplicate
        );
        assert_eq!(
            AluError::UnknownLabel { label: "a".into() }.kind(),
            ErrorKind::Resolution
        );
        assert_eq!(
            AluError::AlreadyBound { signal: "x".into() }.kind(),
            ErrorKind::Declaration
        );
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = AluError::UnknownLabel {
            label: "loop".into(),
        }
        .at(&SourceLocation::new("alu.oasm", 12));
        assert_eq!(diag.to_string(), "alu.oasm:12: Instruction label 'loop' not found");
    }

    #[test]
    fn test_nearest_neighbor_message_names_registers() {
        let err = AluError::NearestNeighborBudget {
            budget: 4,
            registers: vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("but 5 are"));
        assert!(msg.contains("a, b, c, d, e"));
    }

    #[test]
    fn test_diagnostics_into_result() {
        let mut diags = Diagnostics::new();
        assert!(diags.clone().into_result().is_ok());

        diags.push(AluError::BranchAlreadySet.at(&SourceLocation::default()));
        let err = diags.into_result().unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err.has_kind(ErrorKind::Duplicate));
        assert_eq!(err.to_string(), "resource assignment failed with 1 diagnostic(s)");
    }
}
