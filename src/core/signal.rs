//! Signal registry.
//!
//! Signals are named entities with a data type, a behavior and a write-once
//! resource binding. The registry keeps them in declaration order, which the
//! allocator relies on to make binding decisions reproducible. Bit-slices and
//! delayed signals refer back to their base signal by [`SignalId`]; they never
//! own it.

use std::fmt;

use indexmap::IndexMap;

use super::error::{AluError, SourceLocation};
use crate::alu::address::ResourceAddress;

/// Bit 16 of a word is always the v-bit.
pub const V_BIT_SLICE_INDEX: u8 = 16;

/// Only bits 0-3 of a word register may be sliced.
pub const MAX_REG_BIT_SLICE_INDEX: u8 = 3;

/// Longest supported party-line delay.
pub const MAX_SIGNAL_DELAY: u32 = 30;

/// Index of a signal within its registry. Equality is signal identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u32);

impl SignalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bit,
    Word,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bit => f.write_str("bit"),
            DataType::Word => f.write_str("word"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behavior {
    Wire,
    Register,
    Constant,
    BranchCondition,
    CondBypass,
    CondUpdate,
    Builtin,
    Delayed,
    BitSlice,
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Behavior::Wire => "wire",
            Behavior::Register => "reg",
            Behavior::Constant => "const",
            Behavior::BranchCondition => "branch",
            Behavior::CondBypass => "cond_bypass",
            Behavior::CondUpdate => "cond_update",
            Behavior::Builtin => "builtin",
            Behavior::Delayed => "delay",
            Behavior::BitSlice => "bit_slice",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    None,
    In,
    Out,
}

/// A declared signal.
#[derive(Debug, Clone)]
pub struct Signal {
    name: String,
    data_type: DataType,
    behavior: Behavior,
    direction: Direction,
    initial_value: Option<u16>,
    binding: Option<ResourceAddress>,
    uses_warm_reset: bool,
    anonymous: bool,
    base: Option<SignalId>,
    slice_index: Option<u8>,
    delay: u32,
    pub location: SourceLocation,
}

impl Signal {
    fn new(name: &str, behavior: Behavior, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            behavior,
            direction: Direction::None,
            initial_value: None,
            binding: None,
            uses_warm_reset: false,
            anonymous: false,
            base: None,
            slice_index: None,
            delay: 0,
            location: SourceLocation::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// `None` means uninitialized.
    pub fn initial_value(&self) -> Option<u16> {
        self.initial_value
    }

    /// Bound resource address, `None` while unbound.
    pub fn binding(&self) -> Option<ResourceAddress> {
        self.binding
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn uses_warm_reset(&self) -> bool {
        self.uses_warm_reset
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Signal this one is sliced or delayed from.
    pub fn base_signal(&self) -> Option<SignalId> {
        self.base
    }

    /// Bit index of a bit-slice (16 is the v-bit).
    pub fn slice_index(&self) -> Option<u8> {
        self.slice_index
    }

    pub fn delay_count(&self) -> u32 {
        self.delay
    }

    pub fn is_of(&self, behavior: Behavior, data_type: DataType) -> bool {
        self.behavior == behavior && self.data_type == data_type
    }

    /// Builtins with no direction are internal to the ALU and cannot be wired out.
    fn is_internal_builtin(&self) -> bool {
        self.behavior == Behavior::Builtin && self.direction == Direction::None
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : ", self.name)?;
        if self.anonymous {
            f.write_str("anonymous ")?;
        }
        match self.direction {
            Direction::In => f.write_str("input ")?,
            Direction::Out => f.write_str("output ")?,
            Direction::None => {}
        }
        write!(f, "{} {}", self.behavior, self.data_type)?;
        if self.behavior == Behavior::Delayed {
            write!(f, " D{}", self.delay)?;
        }
        if let Some(index) = self.slice_index {
            write!(f, " B{}", index)?;
        }
        if let Some(addr) = self.binding {
            write!(f, " {}", addr.number())?;
        }
        if self.uses_warm_reset {
            f.write_str(" R")?;
        }
        if matches!(self.behavior, Behavior::Constant | Behavior::Register) {
            match self.initial_value {
                Some(v) => write!(f, " = 0x{:04x}", v)?,
                None => f.write_str(" = (unknown)")?,
            }
        }
        Ok(())
    }
}

/// Declaration-ordered table of signals, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct SignalRegistry {
    signals: IndexMap<String, Signal>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new signal. Names must be unique.
    pub fn declare(
        &mut self,
        name: &str,
        behavior: Behavior,
        data_type: DataType,
    ) -> Result<SignalId, AluError> {
        if self.signals.contains_key(name) {
            return Err(AluError::DuplicateSignal {
                name: name.to_string(),
            });
        }
        Ok(self.insert(Signal::new(name, behavior, data_type)))
    }

    fn insert(&mut self, signal: Signal) -> SignalId {
        let (index, _) = self.signals.insert_full(signal.name.clone(), signal);
        SignalId(index as u32)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn contains(&self, id: SignalId) -> bool {
        id.index() < self.signals.len()
    }

    pub fn lookup(&self, name: &str) -> Option<SignalId> {
        self.signals
            .get_index_of(name)
            .map(|index| SignalId(index as u32))
    }

    /// Access a signal by id.
    ///
    /// Ids are only handed out by this registry and signals are never removed,
    /// so an id from another registry is the only way to miss.
    pub fn get(&self, id: SignalId) -> &Signal {
        match self.signals.get_index(id.index()) {
            Some((_, signal)) => signal,
            None => panic!("signal id {} does not belong to this registry", id.0),
        }
    }

    fn get_mut(&mut self, id: SignalId) -> &mut Signal {
        match self.signals.get_index_mut(id.index()) {
            Some((_, signal)) => signal,
            None => panic!("signal id {} does not belong to this registry", id.0),
        }
    }

    pub fn name(&self, id: SignalId) -> &str {
        self.get(id).name()
    }

    /// All signals in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (SignalId, &Signal)> + '_ {
        self.signals
            .values()
            .enumerate()
            .map(|(index, signal)| (SignalId(index as u32), signal))
    }

    /// Ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = SignalId> {
        (0..self.signals.len() as u32).map(SignalId)
    }

    fn ensure_unbound(&self, id: SignalId) -> Result<(), AluError> {
        let signal = self.get(id);
        if signal.is_bound() {
            return Err(AluError::AlreadyBound {
                signal: signal.name.clone(),
            });
        }
        Ok(())
    }

    /// Set the power-on value of a register or constant. Values are truncated to 16 bits.
    pub fn set_initial_value(&mut self, id: SignalId, value: u32) -> Result<(), AluError> {
        self.ensure_unbound(id)?;
        self.get_mut(id).initial_value = Some((value & 0xFFFF) as u16);
        Ok(())
    }

    pub fn set_warm_reset(&mut self, id: SignalId, uses_warm_reset: bool) -> Result<(), AluError> {
        self.ensure_unbound(id)?;
        self.get_mut(id).uses_warm_reset = uses_warm_reset;
        Ok(())
    }

    pub fn set_direction(&mut self, id: SignalId, direction: Direction) -> Result<(), AluError> {
        self.ensure_unbound(id)?;
        self.get_mut(id).direction = direction;
        Ok(())
    }

    pub fn set_location(&mut self, id: SignalId, location: SourceLocation) {
        self.get_mut(id).location = location;
    }

    /// Bind a signal to a resource. Bindings are write-once.
    pub(crate) fn bind_resource(
        &mut self,
        id: SignalId,
        address: ResourceAddress,
    ) -> Result<(), AluError> {
        self.ensure_unbound(id)?;
        log::debug!("bind {} -> {}", self.name(id), address);
        self.get_mut(id).binding = Some(address);
        Ok(())
    }

    /// Reclassify a never-written word register as a constant.
    pub(crate) fn promote_to_constant(&mut self, id: SignalId) {
        let signal = self.get_mut(id);
        debug_assert!(signal.binding.is_none());
        log::debug!("promote register '{}' to constant", signal.name);
        signal.behavior = Behavior::Constant;
        signal.uses_warm_reset = false;
    }

    /// Registers and constants without an initial value start at zero.
    pub(crate) fn apply_default_values(&mut self) {
        for signal in self.signals.values_mut() {
            let stateful = matches!(signal.behavior, Behavior::Register | Behavior::Constant);
            if stateful && signal.initial_value.is_none() {
                log::debug!("'{}' defaults to 0", signal.name);
                signal.initial_value = Some(0);
            }
        }
    }

    /// Bit `index` (0-3) of a local word register.
    ///
    /// Returns the existing slice when the same bit was sliced before.
    pub fn bit_slice(&mut self, base: SignalId, index: u8) -> Result<SignalId, AluError> {
        let signal = self.get(base);
        if !signal.is_of(Behavior::Register, DataType::Word) || index > MAX_REG_BIT_SLICE_INDEX {
            return Err(AluError::IllegalBitSlice {
                signal: signal.name.clone(),
            });
        }
        Ok(self.slice_of(base, index))
    }

    /// The v-bit of a word signal.
    pub fn v_bit(&mut self, base: SignalId) -> Result<SignalId, AluError> {
        let signal = self.get(base);
        if signal.data_type != DataType::Word
            || signal.behavior == Behavior::Constant
            || signal.is_internal_builtin()
        {
            return Err(AluError::IllegalVBit {
                signal: signal.name.clone(),
            });
        }
        Ok(self.slice_of(base, V_BIT_SLICE_INDEX))
    }

    fn slice_of(&mut self, base: SignalId, index: u8) -> SignalId {
        let name = format!("{}[{}]", self.name(base), index);
        if let Some(existing) = self.lookup(&name) {
            return existing;
        }

        let mut slice = Signal::new(&name, Behavior::BitSlice, DataType::Bit);
        slice.base = Some(base);
        slice.slice_index = Some(index);
        slice.anonymous = true;
        self.insert(slice)
    }

    /// `base` delayed by `delay` clocks.
    ///
    /// Delays of delayed signals are summed so the base is never itself delayed,
    /// and delaying a bit-slice yields the same slice of the delayed base.
    pub fn delay(&mut self, base: SignalId, delay: u32) -> Result<SignalId, AluError> {
        let signal = self.get(base);
        if delay < 1 || delay > MAX_SIGNAL_DELAY {
            return Err(AluError::IllegalDelay {
                signal: signal.name.clone(),
                delay,
                max: MAX_SIGNAL_DELAY,
            });
        }

        match (signal.behavior, signal.base, signal.slice_index) {
            (Behavior::BitSlice, Some(inner), Some(index)) => {
                let delayed = self.delay(inner, delay)?;
                Ok(self.slice_of(delayed, index))
            }
            (Behavior::Delayed, Some(inner), _) => {
                let total = signal.delay + delay;
                self.delay(inner, total)
            }
            _ if signal.is_internal_builtin() => Err(AluError::IllegalDelay {
                signal: signal.name.clone(),
                delay,
                max: MAX_SIGNAL_DELAY,
            }),
            _ => {
                let name = format!("{}${}", signal.name, delay);
                if let Some(existing) = self.lookup(&name) {
                    return Ok(existing);
                }

                let mut delayed = Signal::new(&name, Behavior::Delayed, signal.data_type);
                delayed.base = Some(base);
                delayed.delay = delay;
                Ok(self.insert(delayed))
            }
        }
    }
}
