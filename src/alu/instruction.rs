//! ALU instruction model.
//!
//! An [`Instruction`] is built up by the front end with the builder calls below,
//! then handed to [`Alu::add_instruction`](super::Alu::add_instruction), which
//! finalizes it and assigns its index. Branch targets start out as labels and are
//! replaced by instruction indexes when branches are resolved.

use std::fmt;

use super::address::{MAX_CONDITION_LOGIC, MAX_WORD_INS, MAX_WORD_REGS};
use super::branch::BranchCondition;
use super::ops::OpCall;
use super::pool::Pool;
use crate::core::error::{AluError, PoolKind, SourceLocation};
use crate::core::signal::{SignalId, SignalRegistry};

/// Source of the v-bit an instruction outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputBit {
    #[default]
    Zero,
    One,
    /// Pass the incoming v-bit through.
    CarryIn,
    Hold,
}

impl fmt::Display for OutputBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputBit::Zero => "0",
            OutputBit::One => "1",
            OutputBit::CarryIn => "v_in",
            OutputBit::Hold => "hold",
        };
        f.write_str(s)
    }
}

/// One of the four branch targets of an instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum BranchTarget {
    /// Fall through to the next instruction.
    #[default]
    Next,
    Label(String),
    /// Resolved instruction index.
    Index(usize),
    /// The label did not resolve.
    Invalid,
}

impl BranchTarget {
    fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(l) => BranchTarget::Label(l.to_string()),
            None => BranchTarget::Next,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            BranchTarget::Index(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for BranchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchTarget::Next => f.write_str("next"),
            BranchTarget::Label(l) => write!(f, "'{}'", l),
            BranchTarget::Index(i) => write!(f, "{}", i),
            BranchTarget::Invalid => f.write_str("-1"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Instruction {
    label: Option<String>,
    operation: Option<OpCall>,
    destinations: Pool<SignalId>,
    overrides: Pool<(SignalId, bool)>,
    latches: Pool<SignalId>,

    cond_bypass: Option<bool>,
    cond_update_vr: Option<bool>,
    cond_update_tf: Option<bool>,
    wait_for_v: Option<bool>,
    output_bit: Option<OutputBit>,

    branch_set: bool,
    pub(crate) branch_conds: [Option<SignalId>; 2],
    /// Indexed by `2 * cond1 + cond0`.
    pub(crate) targets: [BranchTarget; 4],

    index: Option<usize>,
    pub location: SourceLocation,
}

impl Default for Instruction {
    fn default() -> Self {
        Self::new()
    }
}

impl Instruction {
    pub fn new() -> Self {
        Self {
            label: None,
            operation: None,
            destinations: Pool::new(PoolKind::Destinations, MAX_WORD_REGS),
            overrides: Pool::new(PoolKind::Overrides, MAX_CONDITION_LOGIC),
            latches: Pool::new(PoolKind::Latches, MAX_WORD_INS),
            cond_bypass: None,
            cond_update_vr: None,
            cond_update_tf: None,
            wait_for_v: None,
            output_bit: None,
            branch_set: false,
            branch_conds: [None; 2],
            targets: Default::default(),
            index: None,
            location: SourceLocation::default(),
        }
    }

    pub fn labeled(label: &str) -> Self {
        let mut inst = Self::new();
        inst.label = Some(label.to_string());
        inst
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Position in the program, assigned when the instruction is added to an ALU.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = Some(index);
    }

    pub fn set_operation(&mut self, call: OpCall) -> Result<(), AluError> {
        if self.operation.is_some() {
            return Err(AluError::OperationAlreadySet);
        }
        self.operation = Some(call);
        Ok(())
    }

    pub fn operation(&self) -> Option<&OpCall> {
        self.operation.as_ref()
    }

    pub fn add_destination(
        &mut self,
        dest: SignalId,
        signals: &SignalRegistry,
    ) -> Result<(), AluError> {
        if self.destinations.is_full() {
            return Err(self.destinations.exhausted());
        }
        if self.destinations.contains(&dest) {
            return Err(AluError::DuplicateDestination {
                signal: signals.name(dest).to_string(),
            });
        }
        self.destinations.try_push(dest)?;
        Ok(())
    }

    pub fn destinations(&self) -> &[SignalId] {
        self.destinations.as_slice()
    }

    /// Force condition-logic register `target` to `value` when this instruction runs.
    pub fn add_override(
        &mut self,
        target: SignalId,
        value: bool,
        signals: &SignalRegistry,
    ) -> Result<(), AluError> {
        if self.overrides.is_full() {
            return Err(self.overrides.exhausted());
        }
        if self.overrides.iter().any(|&(s, _)| s == target) {
            return Err(AluError::DuplicateOverride {
                signal: signals.name(target).to_string(),
            });
        }
        self.overrides.try_push((target, value))?;
        Ok(())
    }

    pub fn overrides(&self) -> &[(SignalId, bool)] {
        self.overrides.as_slice()
    }

    pub fn add_latch(
        &mut self,
        signal: SignalId,
        signals: &SignalRegistry,
    ) -> Result<(), AluError> {
        if self.latches.is_full() {
            return Err(self.latches.exhausted());
        }
        if self.latches.contains(&signal) {
            return Err(AluError::DuplicateLatch {
                signal: signals.name(signal).to_string(),
            });
        }
        self.latches.try_push(signal)?;
        Ok(())
    }

    pub fn latches(&self) -> &[SignalId] {
        self.latches.as_slice()
    }

    fn set_flag(flag: &mut Option<bool>, name: &'static str) -> Result<(), AluError> {
        if flag.is_some() {
            return Err(AluError::FlagAlreadySet { flag: name });
        }
        *flag = Some(true);
        Ok(())
    }

    pub fn set_cond_bypass(&mut self) -> Result<(), AluError> {
        Self::set_flag(&mut self.cond_bypass, "cond_bypass")
    }

    pub fn set_cond_update_vr(&mut self) -> Result<(), AluError> {
        Self::set_flag(&mut self.cond_update_vr, "cond_update_vr")
    }

    pub fn set_cond_update_tf(&mut self) -> Result<(), AluError> {
        Self::set_flag(&mut self.cond_update_tf, "cond_update_tf")
    }

    pub fn set_wait_for_v(&mut self) -> Result<(), AluError> {
        Self::set_flag(&mut self.wait_for_v, "wait_for_v")
    }

    pub fn set_output_bit(&mut self, output: OutputBit) -> Result<(), AluError> {
        if self.output_bit.is_some() {
            return Err(AluError::FlagAlreadySet { flag: "v_out" });
        }
        self.output_bit = Some(output);
        Ok(())
    }

    pub fn cond_bypass(&self) -> bool {
        self.cond_bypass.unwrap_or(false)
    }

    pub fn cond_update_vr(&self) -> bool {
        self.cond_update_vr.unwrap_or(false)
    }

    pub fn cond_update_tf(&self) -> bool {
        self.cond_update_tf.unwrap_or(false)
    }

    pub fn wait_for_v(&self) -> bool {
        self.wait_for_v.unwrap_or(false)
    }

    pub fn output_bit(&self) -> OutputBit {
        self.output_bit.unwrap_or_default()
    }

    /// Apply defaults to every flag and selector that was not set.
    pub fn finalize(&mut self) {
        for flag in [
            &mut self.cond_bypass,
            &mut self.cond_update_vr,
            &mut self.cond_update_tf,
            &mut self.wait_for_v,
        ] {
            flag.get_or_insert(false);
        }
        self.output_bit.get_or_insert(OutputBit::Zero);
    }

    pub fn is_finalized(&self) -> bool {
        self.cond_bypass.is_some()
            && self.cond_update_vr.is_some()
            && self.cond_update_tf.is_some()
            && self.wait_for_v.is_some()
            && self.output_bit.is_some()
    }

    fn claim_branch(&mut self) -> Result<(), AluError> {
        if self.branch_set {
            return Err(AluError::BranchAlreadySet);
        }
        self.branch_set = true;
        Ok(())
    }

    fn set_branch(
        &mut self,
        conds: [Option<SignalId>; 2],
        labels: [Option<&str>; 4],
    ) -> Result<(), AluError> {
        self.claim_branch()?;
        self.branch_conds = conds;
        self.targets = labels.map(BranchTarget::from_label);
        Ok(())
    }

    pub fn goto(&mut self, label: &str) -> Result<(), AluError> {
        self.set_branch([None, None], [Some(label); 4])
    }

    /// Branch to `label` when `cond` is set, else fall through.
    pub fn if_then(&mut self, cond: SignalId, label: &str) -> Result<(), AluError> {
        self.set_branch([Some(cond), None], [None, Some(label), None, Some(label)])
    }

    /// Branch to `label` when `cond` is clear, else fall through.
    pub fn if_not(&mut self, cond: SignalId, label: &str) -> Result<(), AluError> {
        self.set_branch([Some(cond), None], [Some(label), None, Some(label), None])
    }

    pub fn if_else(
        &mut self,
        cond: SignalId,
        then: Option<&str>,
        otherwise: Option<&str>,
    ) -> Result<(), AluError> {
        self.set_branch([Some(cond), None], [otherwise, then, otherwise, then])
    }

    /// Four-way branch; `labels[2 * cond1 + cond0]` is taken.
    pub fn case_of4(
        &mut self,
        cond1: SignalId,
        cond0: SignalId,
        labels: [Option<&str>; 4],
    ) -> Result<(), AluError> {
        self.set_branch([Some(cond0), Some(cond1)], labels)
    }

    /// Two-way branch on a reduced condition.
    ///
    /// Constant conditions become jumps and inverted ones swap the targets, so the
    /// stored condition is always the plain register.
    pub fn branch_when(
        &mut self,
        cond: BranchCondition,
        then: Option<&str>,
        otherwise: Option<&str>,
    ) -> Result<(), AluError> {
        let pick = |bit: usize| if cond.value_for(bit) == 1 { then } else { otherwise };
        self.set_branch([cond.signal(), None], [pick(0), pick(1), pick(0), pick(1)])
    }

    /// Four-way branch on reduced conditions; `labels[2 * cond1 + cond0]` is taken.
    pub fn branch_case(
        &mut self,
        cond1: BranchCondition,
        cond0: BranchCondition,
        labels: [Option<&str>; 4],
    ) -> Result<(), AluError> {
        let pick = |entry: usize| {
            let (a, b) = (entry >> 1, entry & 1);
            labels[2 * cond1.value_for(a) + cond0.value_for(b)]
        };
        self.set_branch(
            [cond0.signal(), cond1.signal()],
            [pick(0), pick(1), pick(2), pick(3)],
        )
    }

    pub fn branch_conditions(&self) -> [Option<SignalId>; 2] {
        self.branch_conds
    }

    pub fn targets(&self) -> &[BranchTarget; 4] {
        &self.targets
    }

    /// Resolved target indexes, once every target resolved.
    pub fn target_indexes(&self) -> Option<[usize; 4]> {
        let [a, b, c, d] = &self.targets;
        Some([a.index()?, b.index()?, c.index()?, d.index()?])
    }

    pub fn display<'a>(&'a self, signals: &'a SignalRegistry) -> impl fmt::Display + 'a {
        InstructionDisplay { inst: self, signals }
    }
}

struct InstructionDisplay<'a> {
    inst: &'a Instruction,
    signals: &'a SignalRegistry,
}

impl fmt::Display for InstructionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inst = self.inst;
        match inst.index {
            Some(i) => write!(f, "{}: ", i)?,
            None => f.write_str("-: ")?,
        }
        write!(f, "'{}' ", inst.label().unwrap_or(""))?;

        if !inst.destinations.is_empty() {
            let names: Vec<_> = inst.destinations.iter().map(|&d| self.signals.name(d)).collect();
            write!(f, "{} = ", names.join(", "))?;
        }
        match &inst.operation {
            Some(call) => write!(f, "{}", call.display(self.signals))?,
            None => f.write_str("nop()")?,
        }

        if !inst.overrides.is_empty() {
            let parts: Vec<_> = inst
                .overrides
                .iter()
                .map(|&(s, v)| format!("{}={}", self.signals.name(s), u8::from(v)))
                .collect();
            write!(f, "  {}", parts.join(", "))?;
        }

        write!(
            f,
            "  cb:{}  cu_vr:{}  cu_tf:{}  wait_v:{}  v:{}",
            u8::from(inst.cond_bypass()),
            u8::from(inst.cond_update_vr()),
            u8::from(inst.cond_update_tf()),
            u8::from(inst.wait_for_v()),
            inst.output_bit()
        )?;

        let [t0, t1, t2, t3] = &inst.targets;
        write!(f, "  {},{},{},{}", t0, t1, t2, t3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signal::{Behavior, DataType};

    fn registry() -> (SignalRegistry, SignalId, SignalId, SignalId) {
        let mut signals = SignalRegistry::new();
        let r = signals.declare("r", Behavior::Register, DataType::Word).unwrap();
        let c0 = signals.declare("c0", Behavior::BranchCondition, DataType::Bit).unwrap();
        let c1 = signals.declare("c1", Behavior::BranchCondition, DataType::Bit).unwrap();
        (signals, r, c0, c1)
    }

    fn labels(inst: &Instruction) -> Vec<Option<&str>> {
        inst.targets()
            .iter()
            .map(|t| match t {
                BranchTarget::Label(l) => Some(l.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_duplicate_destination_rejected() {
        let (signals, r, _, _) = registry();
        let mut inst = Instruction::new();
        inst.add_destination(r, &signals).unwrap();
        let err = inst.add_destination(r, &signals).unwrap_err();
        assert_eq!(err, AluError::DuplicateDestination { signal: "r".into() });
        assert_eq!(inst.destinations(), &[r]);
    }

    #[test]
    fn test_override_and_latch_duplicates() {
        let (signals, r, c0, _) = registry();
        let mut inst = Instruction::new();
        inst.add_override(c0, true, &signals).unwrap();
        assert!(matches!(
            inst.add_override(c0, false, &signals),
            Err(AluError::DuplicateOverride { .. })
        ));
        inst.add_latch(r, &signals).unwrap();
        assert!(matches!(inst.add_latch(r, &signals), Err(AluError::DuplicateLatch { .. })));
    }

    #[test]
    fn test_flags_set_once_and_defaults() {
        let mut inst = Instruction::new();
        inst.set_cond_bypass().unwrap();
        assert_eq!(
            inst.set_cond_bypass(),
            Err(AluError::FlagAlreadySet { flag: "cond_bypass" })
        );
        inst.set_output_bit(OutputBit::CarryIn).unwrap();
        assert!(inst.set_output_bit(OutputBit::One).is_err());

        assert!(!inst.is_finalized());
        inst.finalize();
        assert!(inst.is_finalized());
        assert!(inst.cond_bypass());
        assert!(!inst.wait_for_v());
        assert_eq!(inst.output_bit(), OutputBit::CarryIn);
    }

    #[test]
    fn test_branch_builders() {
        let (_, _, c0, c1) = registry();

        let mut inst = Instruction::new();
        inst.if_then(c0, "top").unwrap();
        assert_eq!(labels(&inst), vec![None, Some("top"), None, Some("top")]);
        assert_eq!(inst.branch_conditions(), [Some(c0), None]);
        assert_eq!(inst.goto("x"), Err(AluError::BranchAlreadySet));

        let mut inst = Instruction::new();
        inst.if_not(c0, "top").unwrap();
        assert_eq!(labels(&inst), vec![Some("top"), None, Some("top"), None]);

        let mut inst = Instruction::new();
        inst.if_else(c0, Some("t"), Some("e")).unwrap();
        assert_eq!(labels(&inst), vec![Some("e"), Some("t"), Some("e"), Some("t")]);

        let mut inst = Instruction::new();
        inst.case_of4(c1, c0, [Some("a"), Some("b"), Some("c"), Some("d")]).unwrap();
        assert_eq!(inst.branch_conditions(), [Some(c0), Some(c1)]);
        assert_eq!(labels(&inst), vec![Some("a"), Some("b"), Some("c"), Some("d")]);
    }

    #[test]
    fn test_branch_when_inverted_swaps_targets() {
        let (_, _, c0, _) = registry();
        let mut inst = Instruction::new();
        let cond = BranchCondition::Signal {
            signal: c0,
            inverted: true,
        };
        inst.branch_when(cond, Some("t"), Some("e")).unwrap();
        assert_eq!(inst.branch_conditions(), [Some(c0), None]);
        assert_eq!(labels(&inst), vec![Some("t"), Some("e"), Some("t"), Some("e")]);
    }

    #[test]
    fn test_branch_case_with_constant_and_inverted_conditions() {
        let (_, _, c0, c1) = registry();
        let all = [Some("l0"), Some("l1"), Some("l2"), Some("l3")];

        // cond1 inverted: rows for cond1 = 0 take labels 2 and 3.
        let mut inst = Instruction::new();
        let inv1 = BranchCondition::Signal {
            signal: c1,
            inverted: true,
        };
        let plain0 = BranchCondition::Signal {
            signal: c0,
            inverted: false,
        };
        inst.branch_case(inv1, plain0, all).unwrap();
        assert_eq!(labels(&inst), vec![Some("l2"), Some("l3"), Some("l0"), Some("l1")]);

        // cond1 always set: only labels 2 and 3 are reachable.
        let mut inst = Instruction::new();
        inst.branch_case(BranchCondition::Always, plain0, all).unwrap();
        assert_eq!(inst.branch_conditions(), [Some(c0), None]);
        assert_eq!(labels(&inst), vec![Some("l2"), Some("l3"), Some("l2"), Some("l3")]);

        // Both constant: a plain jump.
        let mut inst = Instruction::new();
        inst.branch_case(BranchCondition::Never, BranchCondition::Always, all).unwrap();
        assert_eq!(inst.branch_conditions(), [None, None]);
        assert_eq!(labels(&inst), vec![Some("l1"); 4]);
    }
}
