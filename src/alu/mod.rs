// This module holds the ALU unit and its resource binding. An Alu owns a signal registry
// and a set of fixed-size resource pools (word registers, word inputs, carry inputs, branch
// registers, the cond_bypass and cond_update slots, shared constants, builtin constants and
// the four condition-logic registers). The front end declares signals, adds instructions
// and binds condition logic through the builder calls in allocator.rs. Then
// assign_resources runs once and binds every remaining register and constant. It checks
// the nearest-neighbor budget and resolves branches. AluDefinition carries the operation
// table, the limits and the builtin signals. It is built explicitly and passed to every
// unit, so there is no global state.

//! ALU resource binding.
//!
//! # Example
//!
//! ```
//! use alubind::alu::{Alu, AluDefinition, Instruction};
//! use alubind::core::{Behavior, DataType};
//!
//! let definition = AluDefinition::standard();
//! let mut alu = Alu::new("counter", &definition);
//! let count = alu.declare("count", Behavior::Register, DataType::Word).unwrap();
//!
//! let mut inst = Instruction::labeled("top");
//! inst.add_destination(count, alu.signals()).unwrap();
//! alu.add_instruction(inst).unwrap();
//!
//! alu.assign_resources().unwrap();
//! assert_eq!(alu.signals().get(count).binding().unwrap().name(), "word0_reg");
//! ```

pub mod address;
pub mod allocator;
pub mod branch;
pub mod condition;
pub mod instruction;
pub mod ops;
pub mod pool;
pub mod report;
pub mod tf_block;

pub use address::{Resource, ResourceAddress};
pub use branch::{BranchCondition, BranchResolver, BranchShape};
pub use condition::{ConditionLogic, LogicEntry};
pub use instruction::{BranchTarget, Instruction, OutputBit};
pub use ops::{ArgCode, OpCall, OpTable, Operand};
pub use pool::Pool;
pub use report::{MappingEntry, MappingReport};
pub use tf_block::TfBlock;

use address::{
    MAX_BRANCHES, MAX_CARRY_INS, MAX_CONSTANTS, MAX_INSTRUCTIONS, MAX_NN_REGS, MAX_WORD_INS,
    MAX_WORD_REGS,
};

use crate::core::error::{AluError, CompileResult, PoolKind, SourceLocation};
use crate::core::signal::{Behavior, DataType, Direction, SignalId, SignalRegistry};

/// Adjustable limits of an ALU. Values may only be lowered from the hardware
/// maxima.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluLimits {
    pub max_instructions: usize,
    pub nn_budget: usize,
}

impl Default for AluLimits {
    fn default() -> Self {
        Self {
            max_instructions: MAX_INSTRUCTIONS,
            nn_budget: MAX_NN_REGS,
        }
    }
}

impl AluLimits {
    pub fn validate(&self) -> Result<(), AluError> {
        if self.max_instructions == 0 || self.max_instructions > MAX_INSTRUCTIONS {
            return Err(AluError::InvalidLimits {
                reason: format!(
                    "max_instructions must be from 1 to {}, got {}",
                    MAX_INSTRUCTIONS, self.max_instructions
                ),
            });
        }
        if self.nn_budget > MAX_NN_REGS {
            return Err(AluError::InvalidLimits {
                reason: format!(
                    "nn_budget must be at most {}, got {}",
                    MAX_NN_REGS, self.nn_budget
                ),
            });
        }
        Ok(())
    }
}

/// A signal every ALU provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinSignal {
    pub name: &'static str,
    pub direction: Direction,
}

const STANDARD_BUILTINS: &[BuiltinSignal] = &[
    // Internal to the ALU.
    BuiltinSignal {
        name: "status",
        direction: Direction::None,
    },
    BuiltinSignal {
        name: "carry",
        direction: Direction::None,
    },
    BuiltinSignal {
        name: "zero",
        direction: Direction::None,
    },
    BuiltinSignal {
        name: "negative",
        direction: Direction::None,
    },
    BuiltinSignal {
        name: "overflow",
        direction: Direction::None,
    },
    // May be connected as inputs.
    BuiltinSignal {
        name: "v_in",
        direction: Direction::In,
    },
    BuiltinSignal {
        name: "warm_reset",
        direction: Direction::In,
    },
];

/// Shared configuration of ALU units: operations, limits and builtin signals.
#[derive(Debug, Clone)]
pub struct AluDefinition {
    ops: OpTable,
    limits: AluLimits,
    builtins: Vec<BuiltinSignal>,
}

impl AluDefinition {
    pub fn standard() -> Self {
        Self {
            ops: OpTable::standard(),
            limits: AluLimits::default(),
            builtins: STANDARD_BUILTINS.to_vec(),
        }
    }

    pub fn with_limits(limits: AluLimits) -> Result<Self, AluError> {
        limits.validate()?;
        Ok(Self {
            limits,
            ..Self::standard()
        })
    }

    pub fn ops(&self) -> &OpTable {
        &self.ops
    }

    pub fn limits(&self) -> &AluLimits {
        &self.limits
    }

    pub fn builtins(&self) -> &[BuiltinSignal] {
        &self.builtins
    }
}

/// Where a unit is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Accepting declarations, instructions and condition logic.
    Building,
    /// Resources assigned successfully.
    Bound,
    /// Resource assignment ran and reported errors.
    Failed,
}

/// One ALU unit.
#[derive(Debug)]
pub struct Alu<'def> {
    name: String,
    definition: &'def AluDefinition,
    signals: SignalRegistry,

    logic: ConditionLogic,
    instructions: Pool<Instruction>,
    word_regs: Pool<SignalId>,
    word_ins: Pool<SignalId>,
    carry_ins: Pool<SignalId>,
    branches: Pool<LogicEntry>,
    cond_bypass: Option<LogicEntry>,
    cond_update: Option<LogicEntry>,
    constants: Pool<SignalId>,
    /// First signal bound to each builtin constant (0, 1, 0xFFFF).
    builtins: [Option<SignalId>; 3],

    state: UnitState,
    pub location: SourceLocation,
}

impl<'def> Alu<'def> {
    pub fn new(name: &str, definition: &'def AluDefinition) -> Self {
        let mut signals = SignalRegistry::new();
        for builtin in definition.builtins() {
            // Builtin names are unique, so neither call can fail on a fresh registry.
            if let Ok(id) = signals.declare(builtin.name, Behavior::Builtin, DataType::Bit) {
                let _ = signals.set_direction(id, builtin.direction);
            }
        }

        Self {
            name: name.to_string(),
            definition,
            signals,
            logic: ConditionLogic::new(),
            instructions: Pool::new(PoolKind::Instructions, definition.limits().max_instructions),
            word_regs: Pool::new(PoolKind::WordRegisters, MAX_WORD_REGS),
            word_ins: Pool::new(PoolKind::WordInputs, MAX_WORD_INS),
            carry_ins: Pool::new(PoolKind::CarryInputs, MAX_CARRY_INS),
            branches: Pool::new(PoolKind::BranchRegisters, MAX_BRANCHES),
            cond_bypass: None,
            cond_update: None,
            constants: Pool::new(PoolKind::Constants, MAX_CONSTANTS),
            builtins: [None; 3],
            state: UnitState::Building,
            location: SourceLocation::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &'def AluDefinition {
        self.definition
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn signals(&self) -> &SignalRegistry {
        &self.signals
    }

    /// Mutable access to the unit's signals.
    ///
    /// Bound signals reject edits; signals declared after
    /// [`assign_resources`](Self::assign_resources) stay unbound.
    pub fn signals_mut(&mut self) -> &mut SignalRegistry {
        &mut self.signals
    }

    /// Declare a signal in this unit.
    pub fn declare(
        &mut self,
        name: &str,
        behavior: Behavior,
        data_type: DataType,
    ) -> CompileResult<SignalId> {
        self.signals
            .declare(name, behavior, data_type)
            .map_err(|e| e.at(&self.location))
    }

    /// Build a call of a standard operation, checked against its signature.
    pub fn operation(&self, name: &str, operands: Vec<Operand>) -> CompileResult<OpCall> {
        self.definition
            .ops()
            .call(name, operands, &self.signals)
            .map_err(|e| e.at(&self.location))
    }

    pub fn instructions(&self) -> &[Instruction] {
        self.instructions.as_slice()
    }

    pub fn condition_logic(&self) -> &ConditionLogic {
        &self.logic
    }

    pub fn branches(&self) -> &[LogicEntry] {
        self.branches.as_slice()
    }

    pub fn cond_bypass(&self) -> Option<&LogicEntry> {
        self.cond_bypass.as_ref()
    }

    pub fn cond_update(&self) -> Option<&LogicEntry> {
        self.cond_update.as_ref()
    }

    pub fn word_regs(&self) -> &[SignalId] {
        self.word_regs.as_slice()
    }

    pub fn word_ins(&self) -> &[SignalId] {
        self.word_ins.as_slice()
    }

    pub fn carry_ins(&self) -> &[SignalId] {
        self.carry_ins.as_slice()
    }

    pub fn constants(&self) -> &[SignalId] {
        self.constants.as_slice()
    }

    /// Signal bound at `address`.
    ///
    /// Constants are bound to a word input; their constant-pool address
    /// (70-71) returns the same signal.
    pub fn signal_at(&self, address: ResourceAddress) -> Option<SignalId> {
        let index = |i: u8| i as usize;
        match address.resource()? {
            Resource::ConditionLogic(i) => self.logic.signal_at(index(i)),
            Resource::WordReg(i) => self.word_regs.get(index(i)).copied(),
            Resource::Branch(i) => self.branches.get(index(i)).map(|e| e.signal),
            Resource::CondBypass => self.cond_bypass.as_ref().map(|e| e.signal),
            Resource::CondUpdate => self.cond_update.as_ref().map(|e| e.signal),
            Resource::WordIn(i) => self.word_ins.get(index(i)).copied(),
            Resource::CarryIn(i) => self.carry_ins.get(index(i)).copied(),
            Resource::Constant(i) => self.constants.get(index(i)).copied(),
            Resource::Builtin0 => self.builtins[0],
            Resource::Builtin1 => self.builtins[1],
            Resource::BuiltinFFFF => self.builtins[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_alu_declares_builtins() {
        let definition = AluDefinition::standard();
        let alu = Alu::new("alu0", &definition);
        let v_in = alu.signals().lookup("v_in").unwrap();
        assert_eq!(alu.signals().get(v_in).direction(), Direction::In);
        let carry = alu.signals().lookup("carry").unwrap();
        assert_eq!(alu.signals().get(carry).behavior(), Behavior::Builtin);
        assert_eq!(alu.state(), UnitState::Building);
    }

    #[test]
    fn test_limits_validation() {
        assert!(AluLimits::default().validate().is_ok());
        let too_many = AluLimits {
            max_instructions: 9,
            ..AluLimits::default()
        };
        assert!(matches!(
            AluDefinition::with_limits(too_many),
            Err(AluError::InvalidLimits { .. })
        ));

        let small = AluLimits {
            max_instructions: 2,
            nn_budget: 1,
        };
        let definition = AluDefinition::with_limits(small).unwrap();
        assert_eq!(definition.limits().max_instructions, 2);
        assert!(definition.ops().contains("add"));
    }

    #[test]
    fn test_operation_reports_location() {
        let definition = AluDefinition::standard();
        let mut alu = Alu::new("alu0", &definition);
        alu.location = SourceLocation::new("unit.oasm", 4);
        let err = alu.operation("frobnicate", vec![]).unwrap_err();
        assert_eq!(err.location.line, 4);
        assert!(matches!(err.error, AluError::UnknownOperation { .. }));
    }
}
