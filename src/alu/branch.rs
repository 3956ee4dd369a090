// This module resolves the branches of an ALU program once resources are bound. Each
// instruction carries two optional branch-condition signals and four targets addressed by
// 2 * cond1 + cond0. The resolver matches each condition against the two bound branch
// registers, reorders an instruction whose conditions are listed opposite to the physical
// register order, and turns target labels into instruction indexes. A missing label falls
// through to the next instruction modulo the real program length. BranchShape then
// classifies the resolved targets into the smallest hardware encoding for code generation.

//! Branch-condition reduction, label resolution and branch shapes.

use hashbrown::HashSet;

use super::instruction::{BranchTarget, Instruction};
use crate::core::error::{AluError, Diagnostics};
use crate::core::signal::{Behavior, SignalId, SignalRegistry};
use crate::truth::{BoolFn, ARG_TABLES};

/// A branch condition reduced to the form the hardware can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchCondition {
    Always,
    Never,
    Signal { signal: SignalId, inverted: bool },
}

impl BranchCondition {
    pub fn signal_of(signal: SignalId) -> Self {
        BranchCondition::Signal {
            signal,
            inverted: false,
        }
    }

    /// Reduce a condition expression. Only constants and a single branch
    /// register, possibly inverted, are accepted.
    pub fn from_fn(cond: &BoolFn, signals: &SignalRegistry) -> Result<Self, AluError> {
        if cond.is_true() {
            return Ok(BranchCondition::Always);
        }
        if cond.is_false() {
            return Ok(BranchCondition::Never);
        }

        let &[signal] = cond.args() else {
            return Err(AluError::ComplexBranchCondition);
        };
        let inverted = match cond.table() {
            t if t == ARG_TABLES[0] => false,
            t if t == !ARG_TABLES[0] => true,
            _ => return Err(AluError::ComplexBranchCondition),
        };

        if !signals.contains(signal) {
            return Err(AluError::ComplexBranchCondition);
        }
        let sig = signals.get(signal);
        if sig.behavior() != Behavior::BranchCondition {
            return Err(AluError::WrongBehavior {
                signal: sig.name().to_string(),
                expected: "a branch condition",
            });
        }

        Ok(BranchCondition::Signal { signal, inverted })
    }

    /// Register tested by the hardware, if any.
    pub fn signal(self) -> Option<SignalId> {
        match self {
            BranchCondition::Signal { signal, .. } => Some(signal),
            _ => None,
        }
    }

    /// Logical value of the condition when its register reads `input` (0 or 1).
    pub(crate) fn value_for(self, input: usize) -> usize {
        match self {
            BranchCondition::Always => 1,
            BranchCondition::Never => 0,
            BranchCondition::Signal { inverted, .. } => input ^ usize::from(inverted),
        }
    }
}

/// Minimal hardware encoding of a resolved instruction's targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchShape {
    /// Unconditional jump to the next instruction; nothing to encode.
    Fallthrough,
    Jump(usize),
    /// Tests a single branch register (0 or 1).
    Single {
        condition: u8,
        taken: usize,
        not_taken: usize,
    },
    Case([usize; 4]),
}

impl BranchShape {
    pub fn classify(index: usize, t: [usize; 4]) -> Self {
        if t[0] == t[1] && t[0] == t[2] && t[0] == t[3] {
            if t[0] == index + 1 {
                BranchShape::Fallthrough
            } else {
                BranchShape::Jump(t[0])
            }
        } else if t[0] == t[2] && t[1] == t[3] {
            BranchShape::Single {
                condition: 0,
                taken: t[1],
                not_taken: t[0],
            }
        } else if t[0] == t[1] && t[2] == t[3] {
            BranchShape::Single {
                condition: 1,
                taken: t[2],
                not_taken: t[0],
            }
        } else {
            BranchShape::Case(t)
        }
    }
}

impl Instruction {
    /// Shape of the resolved branch, `None` until every target resolved.
    pub fn branch_shape(&self) -> Option<BranchShape> {
        Some(BranchShape::classify(self.index()?, self.target_indexes()?))
    }
}

/// Resolves branch conditions and labels of a program against the bound
/// branch registers.
pub struct BranchResolver<'a> {
    signals: &'a SignalRegistry,
    branch_slots: &'a [SignalId],
}

impl<'a> BranchResolver<'a> {
    pub fn new(signals: &'a SignalRegistry, branch_slots: &'a [SignalId]) -> Self {
        Self {
            signals,
            branch_slots,
        }
    }

    fn slot_of(&self, cond: SignalId) -> Option<usize> {
        self.branch_slots.iter().position(|&s| s == cond)
    }

    /// Resolve every instruction, recording problems in `diags`.
    pub fn resolve(&self, instructions: &mut [Instruction], diags: &mut Diagnostics) {
        let count = instructions.len();
        let labels: Vec<Option<String>> = instructions
            .iter()
            .map(|inst| inst.label().map(str::to_string))
            .collect();

        for (i, inst) in instructions.iter_mut().enumerate() {
            self.resolve_conditions(i, inst, diags);
            Self::resolve_targets(i, count, &labels, inst, diags);
            log::debug!(
                "instruction {} targets {},{},{},{}",
                i,
                inst.targets[0],
                inst.targets[1],
                inst.targets[2],
                inst.targets[3]
            );
        }
    }

    fn resolve_conditions(&self, i: usize, inst: &mut Instruction, diags: &mut Diagnostics) {
        let mut slots = [None; 2];
        for (n, cond) in inst.branch_conds.iter().enumerate() {
            let Some(cond) = *cond else { continue };
            slots[n] = self.slot_of(cond);
            if slots[n].is_none() {
                diags.push(
                    AluError::UnassignedBranchCondition {
                        instruction: i,
                        signal: self.signals.name(cond).to_string(),
                    }
                    .at(&inst.location),
                );
            }
        }

        // cond0 must test branch register 0 and cond1 register 1.
        let reversed = (slots[0] == Some(1) && slots[1] != Some(1))
            || (slots[1] == Some(0) && slots[0] != Some(0));
        if reversed {
            inst.branch_conds.swap(0, 1);
            inst.targets.swap(1, 2);
        }
    }

    fn resolve_targets(
        i: usize,
        count: usize,
        labels: &[Option<String>],
        inst: &mut Instruction,
        diags: &mut Diagnostics,
    ) {
        let mut reported = HashSet::new();
        for target in inst.targets.iter_mut() {
            let resolved = match target {
                BranchTarget::Next => BranchTarget::Index((i + 1) % count),
                BranchTarget::Label(label) => {
                    match labels.iter().position(|l| l.as_deref() == Some(label.as_str())) {
                        Some(j) => BranchTarget::Index(j),
                        None => {
                            if reported.insert(label.clone()) {
                                diags.push(
                                    AluError::UnknownLabel {
                                        label: label.clone(),
                                    }
                                    .at(&inst.location),
                                );
                            }
                            BranchTarget::Invalid
                        }
                    }
                }
                BranchTarget::Index(_) | BranchTarget::Invalid => continue,
            };
            *target = resolved;
        }
    }
}
