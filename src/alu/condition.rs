//! Condition-logic registers.
//!
//! Up to four 1-bit registers whose next value is an arbitrary boolean function
//! of at most four bit signals. Both the ALU and the standalone
//! [`TfBlock`](super::TfBlock) build on this pool.

use super::address::{ResourceAddress, MAX_CONDITION_LOGIC};
use super::pool::Pool;
use crate::core::error::{AluError, PoolKind};
use crate::core::signal::{Behavior, DataType, SignalId, SignalRegistry};
use crate::truth::BoolFn;

/// A bound signal together with the function that drives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicEntry {
    pub signal: SignalId,
    pub logic: BoolFn,
}

#[derive(Debug, Clone)]
pub struct ConditionLogic {
    entries: Pool<LogicEntry>,
}

impl Default for ConditionLogic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionLogic {
    pub fn new() -> Self {
        Self {
            entries: Pool::new(PoolKind::ConditionLogic, MAX_CONDITION_LOGIC),
        }
    }

    pub fn entries(&self) -> &[LogicEntry] {
        self.entries.as_slice()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Function driving `signal`, if it is bound here.
    pub fn logic_of(&self, signal: SignalId) -> Option<&BoolFn> {
        self.entries
            .iter()
            .find(|e| e.signal == signal)
            .map(|e| &e.logic)
    }

    pub fn signal_at(&self, index: usize) -> Option<SignalId> {
        self.entries.get(index).map(|e| e.signal)
    }

    /// Bind a declared bit register with an explicit next-value function.
    pub fn add_register(
        &mut self,
        signals: &mut SignalRegistry,
        unit: &str,
        dest: SignalId,
        logic: BoolFn,
    ) -> Result<ResourceAddress, AluError> {
        ensure_declared(signals, unit, dest)?;
        let sig = signals.get(dest);
        if sig.data_type() != DataType::Bit {
            return Err(AluError::WrongDataType {
                signal: sig.name().to_string(),
                expected: DataType::Bit,
            });
        }
        if sig.behavior() != Behavior::Register {
            return Err(AluError::WrongBehavior {
                signal: sig.name().to_string(),
                expected: "a bit reg",
            });
        }
        if sig.is_bound() {
            return Err(AluError::AlreadyBound {
                signal: sig.name().to_string(),
            });
        }
        check_logic_args(signals, unit, &logic)?;
        self.bind(signals, dest, logic)
    }

    /// Bind `signal` so it keeps its own value.
    pub(crate) fn bind_hold(
        &mut self,
        signals: &mut SignalRegistry,
        signal: SignalId,
    ) -> Result<ResourceAddress, AluError> {
        self.bind(signals, signal, BoolFn::from_signal(signal))
    }

    fn bind(
        &mut self,
        signals: &mut SignalRegistry,
        signal: SignalId,
        logic: BoolFn,
    ) -> Result<ResourceAddress, AluError> {
        if self.entries.is_full() {
            return Err(self.entries.exhausted());
        }
        let address = ResourceAddress::condition_logic(self.entries.len());
        signals.bind_resource(signal, address)?;
        self.entries.try_push(LogicEntry { signal, logic })?;
        Ok(address)
    }
}

/// Reject ids that do not belong to the unit's registry.
pub(crate) fn ensure_declared(
    signals: &SignalRegistry,
    unit: &str,
    signal: SignalId,
) -> Result<(), AluError> {
    if signals.contains(signal) {
        Ok(())
    } else {
        Err(AluError::UndeclaredSignal {
            signal: format!("#{}", signal.index()),
            unit: unit.to_string(),
        })
    }
}

/// Every argument of a condition function must be a declared bit signal.
pub(crate) fn check_logic_args(
    signals: &SignalRegistry,
    unit: &str,
    logic: &BoolFn,
) -> Result<(), AluError> {
    for &arg in logic.args() {
        ensure_declared(signals, unit, arg)?;
        let sig = signals.get(arg);
        if sig.data_type() != DataType::Bit {
            return Err(AluError::WrongDataType {
                signal: sig.name().to_string(),
                expected: DataType::Bit,
            });
        }
    }
    Ok(())
}
