//! alubind - resource binding for a reconfigurable ALU.
//!
//! Turns a declarative description of a small ALU (registers, boolean
//! condition logic and a short instruction program with branches) into a
//! unit whose every signal is bound to an address in the hardware's fixed
//! register files.
//!
//! # Primary Usage
//!
//! ```
//! use alubind::alu::{Alu, AluDefinition, Instruction};
//! use alubind::core::{Behavior, DataType};
//! use alubind::truth::BoolFn;
//!
//! let definition = AluDefinition::standard();
//! let mut alu = Alu::new("blink", &definition);
//!
//! let led = alu.declare("led", Behavior::Register, DataType::Word).unwrap();
//! let done = alu.declare("done", Behavior::BranchCondition, DataType::Bit).unwrap();
//! let zero = alu.signals().lookup("zero").unwrap();
//! alu.add_condition_logic(done, BoolFn::from_signal(zero)).unwrap();
//!
//! let mut inst = Instruction::labeled("loop");
//! inst.add_destination(led, alu.signals()).unwrap();
//! inst.if_not(done, "loop").unwrap();
//! alu.add_instruction(inst).unwrap();
//!
//! alu.assign_resources().unwrap();
//! print!("{}", alu.mapping_report());
//! ```
//!
//! # Architecture
//!
//! - [`truth`] - Boolean functions of up to four signals
//! - [`core`] - Shared infrastructure (errors, signals)
//! - [`alu`] - Resource pools, instructions, allocation and branch resolution

pub mod alu;
pub mod core;
pub mod truth;

// Re-export common types from organized modules
pub use alu::{Alu, AluDefinition, AluLimits, Instruction, ResourceAddress, TfBlock};
pub use self::core::{
    // Errors
    AluError, CompileResult, Diagnostic, Diagnostics, ErrorKind, SourceLocation,
    // Signals
    Behavior, DataType, SignalId, SignalRegistry,
};
pub use truth::BoolFn;
