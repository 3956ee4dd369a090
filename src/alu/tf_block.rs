//! Standalone condition-logic unit.
//!
//! A `TfBlock` has only the four condition-logic registers of an ALU and no
//! program. Registers get explicit next-value functions via
//! [`add_condition_register`](TfBlock::add_condition_register). The rest hold
//! their value once [`assign_resources`](TfBlock::assign_resources) runs.

use log::info;

use super::address::{Resource, ResourceAddress};
use super::condition::ConditionLogic;
use super::UnitState;
use crate::core::error::{AluError, CompileResult, Diagnostics, SourceLocation};
use crate::core::signal::{Behavior, DataType, SignalId, SignalRegistry};
use crate::truth::BoolFn;

#[derive(Debug)]
pub struct TfBlock {
    name: String,
    signals: SignalRegistry,
    logic: ConditionLogic,
    state: UnitState,
    pub location: SourceLocation,
}

impl TfBlock {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            signals: SignalRegistry::new(),
            logic: ConditionLogic::new(),
            state: UnitState::Building,
            location: SourceLocation::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn signals(&self) -> &SignalRegistry {
        &self.signals
    }

    pub fn signals_mut(&mut self) -> &mut SignalRegistry {
        &mut self.signals
    }

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

    pub fn condition_logic(&self) -> &ConditionLogic {
        &self.logic
    }

    pub fn signal_at(&self, address: ResourceAddress) -> Option<SignalId> {
        match address.resource()? {
            Resource::ConditionLogic(i) => self.logic.signal_at(i as usize),
            _ => None,
        }
    }

    fn ensure_building(&self) -> Result<(), AluError> {
        if self.state == UnitState::Building {
            Ok(())
        } else {
            Err(AluError::AlreadyAssigned {
                unit: self.name.clone(),
            })
        }
    }

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

    /// Bind every remaining bit register and bit constant to a hold function.
    pub fn assign_resources(&mut self) -> Result<(), Diagnostics> {
        let mut diags = Diagnostics::new();
        if let Err(e) = self.ensure_building() {
            diags.push(e.at(&self.location));
            return Err(diags);
        }

        self.signals.apply_default_values();
        let ids: Vec<SignalId> = self.signals.ids().collect();
        for id in ids {
            let sig = self.signals.get(id);
            if sig.is_bound() || !matches!(sig.behavior(), Behavior::Register | Behavior::Constant)
            {
                continue;
            }
            let location = sig.location.clone();
            let result = match sig.data_type() {
                DataType::Word => Err(AluError::WrongDataType {
                    signal: sig.name().to_string(),
                    expected: DataType::Bit,
                }),
                DataType::Bit => self.logic.bind_hold(&mut self.signals, id).map(|_| ()),
            };
            if let Err(e) = result {
                diags.push(e.at(&location));
            }
        }

        self.state = if diags.is_empty() {
            UnitState::Bound
        } else {
            UnitState::Failed
        };
        info!(
            "{}: {} condition regs, {} diagnostic(s)",
            self.name,
            self.logic.len(),
            diags.len()
        );
        diags.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ErrorKind, PoolKind};

    #[test]
    fn test_explicit_and_hold_registers() {
        let mut tf = TfBlock::new("flags");
        let a = tf.declare("a", Behavior::Register, DataType::Bit).unwrap();
        let b = tf.declare("b", Behavior::Register, DataType::Bit).unwrap();
        let one = tf.declare("one", Behavior::Constant, DataType::Bit).unwrap();

        let toggle = BoolFn::from_signal(b).not();
        tf.add_condition_register(b, toggle.clone()).unwrap();
        tf.assign_resources().unwrap();

        let logic = tf.condition_logic();
        assert_eq!(logic.logic_of(b), Some(&toggle));
        assert!(logic.logic_of(a).unwrap().is_hold(a));
        assert_eq!(tf.signals().get(a).initial_value(), Some(0));
        assert_eq!(tf.signals().get(one).binding(), Some(ResourceAddress::condition_logic(2)));
        assert_eq!(tf.signal_at(ResourceAddress::condition_logic(1)), Some(a));
        assert_eq!(tf.state(), UnitState::Bound);
    }

    #[test]
    fn test_word_signals_rejected() {
        let mut tf = TfBlock::new("flags");
        tf.declare("w", Behavior::Register, DataType::Word).unwrap();
        tf.declare("k", Behavior::Constant, DataType::Word).unwrap();

        let diags = tf.assign_resources().unwrap_err();
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| matches!(
            d.error,
            AluError::WrongDataType { expected: DataType::Bit, .. }
        )));
        assert_eq!(tf.state(), UnitState::Failed);
    }

    #[test]
    fn test_too_many_registers() {
        let mut tf = TfBlock::new("flags");
        for i in 0..5 {
            tf.declare(&format!("r{i}"), Behavior::Register, DataType::Bit).unwrap();
        }
        let diags = tf.assign_resources().unwrap_err();
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.kind(), ErrorKind::Capacity);
        assert!(matches!(
            diag.error,
            AluError::PoolExhausted { pool: PoolKind::ConditionLogic, .. }
        ));
    }
}
