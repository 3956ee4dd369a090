// This module is the ALU's resource allocator. It has two halves. The builder calls run
// while the front end is still describing the unit. add_instruction registers an
// instruction and binds the wires and latches it reads into the input pools. The
// add_condition_logic and add_condition_register calls bind bit signals driven by boolean
// functions. assign_resources is the terminal pass. It promotes word registers that are
// never written to constants and binds every remaining register and constant in
// declaration order. It checks the nearest-neighbor budget and hands the program to the
// branch resolver. Every phase runs even after an earlier one reported a problem, so a
// single pass surfaces all independent diagnostics.

//! Resource allocation for [`Alu`] units.

use log::{debug, info};

use super::address::{ResourceAddress, MAX_WORD_INS, MAX_WORD_REGS};
use super::branch::BranchResolver;
use super::condition::{check_logic_args, ensure_declared, LogicEntry};
use super::instruction::Instruction;
use super::pool::Pool;
use super::{Alu, UnitState};
use crate::core::error::{AluError, CompileResult, Diagnostics};
use crate::core::signal::{
    Behavior, DataType, SignalId, SignalRegistry, MAX_REG_BIT_SLICE_INDEX,
};
use crate::truth::BoolFn;

/// Whether some bit-slice takes bit 0-3 of `base`.
fn has_register_slice(signals: &SignalRegistry, base: SignalId) -> bool {
    signals.iter().any(|(_, s)| {
        s.behavior() == Behavior::BitSlice
            && s.base_signal() == Some(base)
            && matches!(s.slice_index(), Some(i) if i <= MAX_REG_BIT_SLICE_INDEX)
    })
}

fn builtin_for(value: Option<u16>) -> Option<(usize, ResourceAddress)> {
    match value? {
        0 => Some((0, ResourceAddress::BUILTIN_0)),
        1 => Some((1, ResourceAddress::BUILTIN_1)),
        0xFFFF => Some((2, ResourceAddress::BUILTIN_FFFF)),
        _ => None,
    }
}

impl<'def> Alu<'def> {
    fn ensure_building(&self) -> Result<(), AluError> {
        match self.state {
            UnitState::Building => Ok(()),
            UnitState::Bound | UnitState::Failed => Err(AluError::AlreadyAssigned {
                unit: self.name.clone(),
            }),
        }
    }

    /// Append an instruction to the program and return its index.
    ///
    /// Unbound wire and delayed operands are bound to word or carry inputs and
    /// unbound latches to word inputs. Either everything is bound and the
    /// instruction is added, or nothing changes.
    pub fn add_instruction(&mut self, mut inst: Instruction) -> CompileResult<usize> {
        let location = inst.location.clone();
        self.try_add_instruction(&mut inst)
            .map_err(|e| e.at(&location))?;

        let index = self.instructions.len();
        inst.set_index(index);
        self.instructions
            .try_push(inst)
            .map_err(|e| e.at(&location))?;
        debug!("{}: added instruction {}", self.name, index);
        Ok(index)
    }

    fn try_add_instruction(&mut self, inst: &mut Instruction) -> Result<(), AluError> {
        self.ensure_building()?;
        if self.instructions.is_full() {
            return Err(self.instructions.exhausted());
        }
        if let Some(label) = inst.label().filter(|l| !l.is_empty()) {
            if self.instructions.iter().any(|other| other.label() == Some(label)) {
                return Err(AluError::DuplicateLabel {
                    label: label.to_string(),
                });
            }
        }

        inst.finalize();
        self.check_instruction(inst)?;

        let pending = self.pending_inputs(inst)?;
        let words = pending
            .iter()
            .filter(|&&id| self.signals.get(id).data_type() == DataType::Word)
            .count();
        let bits = pending.len() - words;
        if self.word_ins.len() + words > self.word_ins.capacity() {
            return Err(self.word_ins.exhausted());
        }
        if self.carry_ins.len() + bits > self.carry_ins.capacity() {
            return Err(self.carry_ins.exhausted());
        }

        for id in pending {
            self.bind_input(id)?;
        }
        Ok(())
    }

    /// Structural checks on the signals an instruction names.
    fn check_instruction(&self, inst: &Instruction) -> Result<(), AluError> {
        let signals = &self.signals;
        for &dest in inst.destinations() {
            ensure_declared(signals, &self.name, dest)?;
            let sig = signals.get(dest);
            if !sig.is_of(Behavior::Register, DataType::Word) {
                return Err(AluError::WrongBehavior {
                    signal: sig.name().to_string(),
                    expected: "a word reg",
                });
            }
        }
        for &(target, _) in inst.overrides() {
            ensure_declared(signals, &self.name, target)?;
            let sig = signals.get(target);
            if !sig.is_of(Behavior::Register, DataType::Bit) {
                return Err(AluError::WrongBehavior {
                    signal: sig.name().to_string(),
                    expected: "a bit reg",
                });
            }
        }
        for &latch in inst.latches() {
            ensure_declared(signals, &self.name, latch)?;
            let sig = signals.get(latch);
            if sig.data_type() != DataType::Word {
                return Err(AluError::WrongDataType {
                    signal: sig.name().to_string(),
                    expected: DataType::Word,
                });
            }
        }
        if let Some(call) = inst.operation() {
            for id in call.signals() {
                ensure_declared(signals, &self.name, id)?;
            }
        }
        for cond in inst.branch_conditions().into_iter().flatten() {
            ensure_declared(signals, &self.name, cond)?;
        }
        Ok(())
    }

    /// Unbound signals the instruction needs bound to inputs, without repeats.
    fn pending_inputs(&self, inst: &Instruction) -> Result<Vec<SignalId>, AluError> {
        let mut pending = Vec::new();

        if let Some(call) = inst.operation() {
            for id in call.signals() {
                let sig = self.signals.get(id);
                let auto = matches!(sig.behavior(), Behavior::Wire | Behavior::Delayed);
                if auto && !sig.is_bound() && !pending.contains(&id) {
                    pending.push(id);
                }
            }
        }

        for &latch in inst.latches() {
            let sig = self.signals.get(latch);
            match sig.binding() {
                Some(address) if !address.is_word_in() => {
                    return Err(AluError::IllegalLatchTarget {
                        signal: sig.name().to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    if !pending.contains(&latch) {
                        pending.push(latch);
                    }
                }
            }
        }
        Ok(pending)
    }

    fn bind_input(&mut self, id: SignalId) -> Result<ResourceAddress, AluError> {
        let (pool, address_of): (&mut Pool<SignalId>, fn(usize) -> ResourceAddress) =
            match self.signals.get(id).data_type() {
                DataType::Word => (&mut self.word_ins, ResourceAddress::word_in),
                DataType::Bit => (&mut self.carry_ins, ResourceAddress::carry_in),
            };
        if pool.is_full() {
            return Err(pool.exhausted());
        }
        let address = address_of(pool.len());
        self.signals.bind_resource(id, address)?;
        pool.try_push(id)?;
        Ok(address)
    }

    /// Bind a branch condition, cond_bypass or cond_update signal to the
    /// function that drives it.
    pub fn add_condition_logic(
        &mut self,
        dest: SignalId,
        logic: BoolFn,
    ) -> CompileResult<ResourceAddress> {
        self.try_add_condition_logic(dest, logic)
            .map_err(|e| e.at(&self.location))
    }

    fn try_add_condition_logic(
        &mut self,
        dest: SignalId,
        logic: BoolFn,
    ) -> Result<ResourceAddress, AluError> {
        self.ensure_building()?;
        ensure_declared(&self.signals, &self.name, dest)?;

        let sig = self.signals.get(dest);
        let name = sig.name().to_string();
        if sig.data_type() != DataType::Bit {
            return Err(AluError::WrongDataType {
                signal: name,
                expected: DataType::Bit,
            });
        }
        let behavior = sig.behavior();
        if !matches!(
            behavior,
            Behavior::BranchCondition | Behavior::CondBypass | Behavior::CondUpdate
        ) {
            return Err(AluError::WrongBehavior {
                signal: name,
                expected: "a branch, cond_bypass or cond_update signal",
            });
        }
        if sig.is_bound() {
            return Err(AluError::AlreadyBound { signal: name });
        }
        check_logic_args(&self.signals, &self.name, &logic)?;

        let entry = LogicEntry { signal: dest, logic };
        let address = match behavior {
            Behavior::BranchCondition => {
                if self.branches.is_full() {
                    return Err(self.branches.exhausted());
                }
                let address = ResourceAddress::branch(self.branches.len());
                self.signals.bind_resource(dest, address)?;
                self.branches.try_push(entry)?;
                address
            }
            _ => {
                let (slot, label, address) = if behavior == Behavior::CondBypass {
                    (&mut self.cond_bypass, "cond_bypass", ResourceAddress::COND_BYPASS)
                } else {
                    (&mut self.cond_update, "cond_update", ResourceAddress::COND_UPDATE)
                };
                if slot.is_some() {
                    return Err(AluError::SlotOccupied {
                        slot: label,
                        signal: name,
                    });
                }
                self.signals.bind_resource(dest, address)?;
                *slot = Some(entry);
                address
            }
        };
        debug!("{}: {} = {}", self.name, name, address);
        Ok(address)
    }

    /// Bind a bit register to a condition-logic slot with an explicit
    /// next-value function.
    pub fn add_condition_register(
        &mut self,
        dest: SignalId,
        logic: BoolFn,
    ) -> CompileResult<ResourceAddress> {
        self.ensure_building().map_err(|e| e.at(&self.location))?;
        self.logic
            .add_register(&mut self.signals, &self.name, dest, logic)
            .map_err(|e| e.at(&self.location))
    }

    /// Bind every remaining register and constant, check hardware limits and
    /// resolve branches.
    ///
    /// Runs once per unit; later calls fail with
    /// [`AluError::AlreadyAssigned`].
    pub fn assign_resources(&mut self) -> Result<(), Diagnostics> {
        if let Err(e) = self.ensure_building() {
            let mut diags = Diagnostics::new();
            diags.push(e.at(&self.location));
            return Err(diags);
        }

        let mut diags = Diagnostics::new();
        self.signals.apply_default_values();
        self.promote_dead_registers();
        self.bind_signals(&mut diags);
        self.check_nearest_neighbors(&mut diags);

        let branch_slots: Vec<SignalId> = self.branches.iter().map(|e| e.signal).collect();
        BranchResolver::new(&self.signals, &branch_slots)
            .resolve(self.instructions.as_mut_slice(), &mut diags);

        self.state = if diags.is_empty() {
            UnitState::Bound
        } else {
            UnitState::Failed
        };
        info!(
            "{}: {} instructions, {} word regs, {} word ins, {} carry ins, {} constants, {} condition regs, {} diagnostic(s)",
            self.name,
            self.instructions.len(),
            self.word_regs.len(),
            self.word_ins.len(),
            self.carry_ins.len(),
            self.constants.len(),
            self.logic.len(),
            diags.len()
        );
        diags.into_result()
    }

    /// Word registers that are never written become constants.
    fn promote_dead_registers(&mut self) {
        let dead: Vec<SignalId> = self
            .signals
            .iter()
            .filter(|(_, s)| s.is_of(Behavior::Register, DataType::Word) && !s.is_bound())
            .map(|(id, _)| id)
            .filter(|&id| {
                !self
                    .instructions
                    .iter()
                    .any(|inst| inst.destinations().contains(&id))
                    && !has_register_slice(&self.signals, id)
            })
            .collect();

        for id in dead {
            self.signals.promote_to_constant(id);
        }
    }

    fn bind_signals(&mut self, diags: &mut Diagnostics) {
        let ids: Vec<SignalId> = self.signals.ids().collect();
        for id in ids {
            let sig = self.signals.get(id);
            if sig.is_bound() {
                continue;
            }
            let location = sig.location.clone();
            let result = match (sig.data_type(), sig.behavior()) {
                (DataType::Word, Behavior::Register) => self.bind_word_reg(id).map(|_| ()),
                (DataType::Bit, Behavior::Register) => self.bind_bit(id),
                (DataType::Bit, Behavior::Constant) => match self.find_alias(id) {
                    Some(address) => self.signals.bind_resource(id, address),
                    None => self.bind_bit(id),
                },
                (DataType::Word, Behavior::Constant) => self.bind_word_constant(id),
                _ => Ok(()),
            };
            if let Err(e) = result {
                diags.push(e.at(&location));
            }
        }
    }

    fn bind_bit(&mut self, id: SignalId) -> Result<(), AluError> {
        self.logic.bind_hold(&mut self.signals, id)?;
        Ok(())
    }

    fn bind_word_reg(&mut self, id: SignalId) -> Result<ResourceAddress, AluError> {
        if self.word_regs.is_full() {
            return Err(self.word_regs.exhausted());
        }
        let address = ResourceAddress::word_reg(self.word_regs.len());
        self.signals.bind_resource(id, address)?;
        self.word_regs.try_push(id)?;
        Ok(address)
    }

    /// Address of an earlier bound constant of the same type and value.
    fn find_alias(&self, id: SignalId) -> Option<ResourceAddress> {
        let sig = self.signals.get(id);
        self.signals
            .iter()
            .filter(|&(other, _)| other != id)
            .filter(|(_, other)| {
                other.is_of(Behavior::Constant, sig.data_type())
                    && other.initial_value() == sig.initial_value()
            })
            .find_map(|(_, other)| other.binding())
    }

    fn bind_word_constant(&mut self, id: SignalId) -> Result<(), AluError> {
        if let Some(address) = self.find_alias(id) {
            return self.signals.bind_resource(id, address);
        }

        let sig = self.signals.get(id);
        let name = sig.name().to_string();
        if let Some((slot, address)) = builtin_for(sig.initial_value()) {
            self.signals.bind_resource(id, address)?;
            self.builtins[slot].get_or_insert(id);
            return Ok(());
        }

        if !self.constants.is_full() {
            // A shared constant is driven through the word input with the same index.
            if self.word_ins.is_full() {
                return Err(AluError::ConstantInput {
                    signal: name,
                    capacity: MAX_WORD_INS,
                });
            }
            let address = ResourceAddress::word_in(self.word_ins.len());
            self.signals.bind_resource(id, address)?;
            self.word_ins.try_push(id)?;
            self.constants.try_push(id)?;
            return Ok(());
        }

        if self.word_regs.is_full() {
            return Err(AluError::ConstantSpill {
                signal: name,
                capacity: MAX_WORD_REGS,
            });
        }
        debug!("{}: constant '{}' spills to a word register", self.name, name);
        self.bind_word_reg(id)?;
        Ok(())
    }

    fn check_nearest_neighbors(&self, diags: &mut Diagnostics) {
        let registers: Vec<String> = self
            .word_regs
            .iter()
            .filter(|&&id| {
                let sig = self.signals.get(id);
                sig.initial_value().unwrap_or(0) != 0
                    || sig.uses_warm_reset()
                    || has_register_slice(&self.signals, id)
            })
            .map(|&id| self.signals.name(id).to_string())
            .collect();

        let budget = self.definition.limits().nn_budget;
        if registers.len() > budget {
            diags.push(
                AluError::NearestNeighborBudget { budget, registers }.at(&self.location),
            );
        }
    }
}
