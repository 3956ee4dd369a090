//! ALU operation signatures and typed operation calls.
//!
//! The standard table is generated at build time from `data/alu_ops.def`.

use std::fmt;

use hashbrown::HashMap;

use crate::core::error::AluError;
use crate::core::signal::{DataType, SignalId, SignalRegistry};

include!(concat!(env!("OUT_DIR"), "/alu_ops.rs"));

/// Maximum operand count of one operation.
pub const MAX_OPERANDS: usize = 4;

/// Operand type code of an operation signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgCode {
    /// `w`: word signal or 16-bit immediate.
    Word,
    /// `b`: bit signal or 0/1 immediate.
    Bit,
    /// `k`: unsigned immediate 0-15.
    Nibble,
}

impl ArgCode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'w' => Some(ArgCode::Word),
            'b' => Some(ArgCode::Bit),
            'k' => Some(ArgCode::Nibble),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            ArgCode::Word => 'w',
            ArgCode::Bit => 'b',
            ArgCode::Nibble => 'k',
        }
    }

    /// Parse a code string such as `wwb`.
    pub fn parse_codes(codes: &str) -> Option<Vec<ArgCode>> {
        if codes.len() > MAX_OPERANDS {
            return None;
        }
        codes.chars().map(ArgCode::from_char).collect()
    }

    fn check(self, operand: Operand, signals: &SignalRegistry) -> Result<(), &'static str> {
        match (self, operand) {
            (ArgCode::Word, Operand::Immediate(v)) if v <= 0xFFFF => Ok(()),
            (ArgCode::Word, Operand::Signal(id))
                if signals.get(id).data_type() == DataType::Word =>
            {
                Ok(())
            }
            (ArgCode::Word, _) => Err("must be a word signal or 16-bit immediate"),

            (ArgCode::Bit, Operand::Immediate(v)) if v <= 1 => Ok(()),
            (ArgCode::Bit, Operand::Signal(id)) if signals.get(id).data_type() == DataType::Bit => {
                Ok(())
            }
            (ArgCode::Bit, _) => Err("must be a bit signal or the immediate 0 or 1"),

            (ArgCode::Nibble, Operand::Immediate(v)) if v <= 15 => Ok(()),
            (ArgCode::Nibble, _) => Err("must be an immediate from 0 to 15"),
        }
    }
}

/// One operand of an operation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Signal(SignalId),
    Immediate(u32),
}

impl Operand {
    pub fn signal(self) -> Option<SignalId> {
        match self {
            Operand::Signal(id) => Some(id),
            Operand::Immediate(_) => None,
        }
    }
}

/// A validated call of a named operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpCall {
    name: String,
    operands: Vec<Operand>,
}

impl OpCall {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Signal operands in argument order.
    pub fn signals(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.operands.iter().filter_map(|op| op.signal())
    }

    pub fn display<'a>(&'a self, signals: &'a SignalRegistry) -> impl fmt::Display + 'a {
        OpCallDisplay { call: self, signals }
    }
}

struct OpCallDisplay<'a> {
    call: &'a OpCall,
    signals: &'a SignalRegistry,
}

impl fmt::Display for OpCallDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.call.name)?;
        for (i, operand) in self.call.operands.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match *operand {
                Operand::Signal(id) => f.write_str(self.signals.name(id))?,
                Operand::Immediate(v) => write!(f, "{}", v)?,
            }
        }
        f.write_str(")")
    }
}

/// Operation name to overload signatures.
#[derive(Debug, Clone, Default)]
pub struct OpTable {
    ops: HashMap<String, Vec<Vec<ArgCode>>>,
}

impl OpTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The operations every ALU supports.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for &(name, codes) in STANDARD_OPS {
            // Codes were validated when the table was generated.
            if let Some(args) = ArgCode::parse_codes(codes) {
                table.insert(name, args);
            }
        }
        table
    }

    /// Add an overload. An identical signature is only recorded once.
    pub fn insert(&mut self, name: &str, args: Vec<ArgCode>) {
        let overloads = self.ops.entry(name.to_string()).or_default();
        if !overloads.contains(&args) {
            overloads.push(args);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    pub fn overloads(&self, name: &str) -> &[Vec<ArgCode>] {
        self.ops.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Build a call of `name`, choosing the overload with a matching arity and
    /// checking each operand against its type code.
    pub fn call(
        &self,
        name: &str,
        operands: Vec<Operand>,
        signals: &SignalRegistry,
    ) -> Result<OpCall, AluError> {
        let signature = self
            .overloads(name)
            .iter()
            .find(|args| args.len() == operands.len())
            .ok_or_else(|| AluError::UnknownOperation {
                name: name.to_string(),
                arity: operands.len(),
            })?;

        for (position, (&code, &operand)) in signature.iter().zip(&operands).enumerate() {
            if let Operand::Signal(id) = operand {
                if !signals.contains(id) {
                    return Err(AluError::InvalidOperand {
                        operation: name.to_string(),
                        position,
                        reason: "is not a declared signal",
                    });
                }
            }
            code.check(operand, signals)
                .map_err(|reason| AluError::InvalidOperand {
                    operation: name.to_string(),
                    position,
                    reason,
                })?;
        }

        Ok(OpCall {
            name: name.to_string(),
            operands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signal::Behavior;

    fn setup() -> (OpTable, SignalRegistry, SignalId, SignalId) {
        let mut signals = SignalRegistry::new();
        let w = signals.declare("w", Behavior::Wire, DataType::Word).unwrap();
        let b = signals.declare("b", Behavior::Wire, DataType::Bit).unwrap();
        (OpTable::standard(), signals, w, b)
    }

    #[test]
    fn test_standard_table_loaded() {
        let table = OpTable::standard();
        assert!(!table.is_empty());
        assert!(table.contains("add"));
        assert_eq!(table.overloads("add"), &[vec![ArgCode::Word, ArgCode::Word]]);
        assert!(table.overloads("and").len() >= 2);
        assert!(table.overloads("no_such_op").is_empty());
    }

    #[test]
    fn test_call_checks_operand_types() {
        let (table, signals, w, b) = setup();

        let call = table
            .call("add", vec![Operand::Signal(w), Operand::Immediate(0xFFFF)], &signals)
            .unwrap();
        assert_eq!(call.signals().collect::<Vec<_>>(), vec![w]);
        assert_eq!(call.display(&signals).to_string(), "add(w, 65535)");

        let err = table
            .call("add", vec![Operand::Signal(b), Operand::Signal(w)], &signals)
            .unwrap_err();
        assert!(matches!(err, AluError::InvalidOperand { position: 0, .. }));

        let err = table
            .call("add", vec![Operand::Signal(w), Operand::Immediate(0x10000)], &signals)
            .unwrap_err();
        assert!(matches!(err, AluError::InvalidOperand { position: 1, .. }));

        let carry = |bit| vec![Operand::Signal(w), Operand::Signal(w), Operand::Immediate(bit)];
        table.call("hadd", carry(1), &signals).unwrap();
        assert!(table.call("hadd", carry(2), &signals).is_err());
    }

    #[test]
    fn test_call_picks_overload_by_arity() {
        let (table, signals, w, _) = setup();
        let two = table.call("and", vec![Operand::Signal(w); 2], &signals).unwrap();
        let three = table.call("and", vec![Operand::Signal(w); 3], &signals).unwrap();
        assert_eq!(two.operands().len(), 2);
        assert_eq!(three.operands().len(), 3);

        let err = table.call("and", vec![Operand::Signal(w)], &signals).unwrap_err();
        assert_eq!(
            err,
            AluError::UnknownOperation {
                name: "and".into(),
                arity: 1
            }
        );
    }

    #[test]
    fn test_nibble_operand_must_be_immediate() {
        let mut table = OpTable::new();
        table.insert("rot", ArgCode::parse_codes("wk").unwrap());
        let (_, signals, w, _) = setup();

        assert!(table
            .call("rot", vec![Operand::Signal(w), Operand::Immediate(15)], &signals)
            .is_ok());
        assert!(table
            .call("rot", vec![Operand::Signal(w), Operand::Immediate(16)], &signals)
            .is_err());
        assert!(table
            .call("rot", vec![Operand::Signal(w), Operand::Signal(w)], &signals)
            .is_err());
    }
}
