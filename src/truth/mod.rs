// This module implements the boolean-function engine used for condition logic. A BoolFn is
// a function of up to four bit signals stored as a 16-entry truth table: bit i of the table
// is the output for the input combination i, where bit k of i is the value of argument k.
// Combining two functions that use different or overlapping argument lists merges the
// argument lists and permutes the second table with closed-form transpositions (see
// permute.rs) so both tables agree on which position holds which signal. Each function also
// carries a postfix expression trace that render.rs turns back into an infix expression for
// code generation.

//! Boolean functions of up to four bit signals.
//!
//! Argument positions beyond the argument count are treated as always 0. Every
//! table produced here is independent of those positions, so the convention only
//! matters when evaluating.

mod permute;
mod render;

pub use permute::{swap_bits, transpose};
pub use render::{render_infix, trace_string};

use std::fmt;

use thiserror::Error;

use crate::core::signal::{SignalId, SignalRegistry};

/// Maximum number of arguments of one function.
pub const MAX_ARGS: usize = 4;

pub const TABLE_FALSE: u16 = 0x0000;
pub const TABLE_TRUE: u16 = 0xFFFF;

/// Table of the identity function of each argument position.
pub const ARG_TABLES: [u16; MAX_ARGS] = [0xAAAA, 0xCCCC, 0xF0F0, 0xFF00];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogicError {
    #[error("Cannot create truth function with more than {limit} arguments")]
    TooManyArguments { limit: usize },

    #[error("Cannot create truth function from integer value: {value}")]
    InvalidConstant { value: u32 },
}

/// One postfix trace token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Argument position 0-3.
    Arg(u8),
    Not,
    And,
    Or,
    Xor,
    True,
    False,
}

/// Source of signal names when rendering a function.
pub trait SignalNames {
    fn signal_name(&self, id: SignalId) -> Option<&str>;
}

impl SignalNames for SignalRegistry {
    fn signal_name(&self, id: SignalId) -> Option<&str> {
        self.contains(id).then(|| self.name(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    And,
    Or,
    Xor,
}

impl BinaryOp {
    fn apply(self, lhs: u16, rhs: u16) -> u16 {
        match self {
            BinaryOp::And => lhs & rhs,
            BinaryOp::Or => lhs | rhs,
            BinaryOp::Xor => lhs ^ rhs,
        }
    }

    fn token(self) -> Token {
        match self {
            BinaryOp::And => Token::And,
            BinaryOp::Or => Token::Or,
            BinaryOp::Xor => Token::Xor,
        }
    }
}

/// A boolean function value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoolFn {
    args: Vec<SignalId>,
    table: u16,
    trace: Vec<Token>,
}

impl BoolFn {
    pub fn constant_true() -> Self {
        Self {
            args: Vec::new(),
            table: TABLE_TRUE,
            trace: vec![Token::True],
        }
    }

    pub fn constant_false() -> Self {
        Self {
            args: Vec::new(),
            table: TABLE_FALSE,
            trace: vec![Token::False],
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::constant_true()
        } else {
            Self::constant_false()
        }
    }

    /// Constant from the integer literal 0 or 1.
    pub fn from_int(value: u32) -> Result<Self, LogicError> {
        match value {
            0 => Ok(Self::constant_false()),
            1 => Ok(Self::constant_true()),
            _ => Err(LogicError::InvalidConstant { value }),
        }
    }

    /// The function that equals `signal`.
    pub fn from_signal(signal: SignalId) -> Self {
        Self {
            args: vec![signal],
            table: ARG_TABLES[0],
            trace: vec![Token::Arg(0)],
        }
    }

    pub fn args(&self) -> &[SignalId] {
        &self.args
    }

    pub fn num_args(&self) -> usize {
        self.args.len()
    }

    pub fn table(&self) -> u16 {
        self.table
    }

    pub fn trace(&self) -> &[Token] {
        &self.trace
    }

    pub fn is_false(&self) -> bool {
        self.table == TABLE_FALSE
    }

    pub fn is_true(&self) -> bool {
        self.table == TABLE_TRUE
    }

    /// Whether this function just passes `signal` through unchanged.
    pub fn is_hold(&self, signal: SignalId) -> bool {
        self.table == ARG_TABLES[0] && self.args.len() == 1 && self.args[0] == signal
    }

    /// Output for the given argument values.
    pub fn evaluate<F>(&self, value_of: F) -> bool
    where
        F: Fn(SignalId) -> bool,
    {
        let row = self
            .args
            .iter()
            .enumerate()
            .filter(|&(_, &arg)| value_of(arg))
            .fold(0u32, |row, (position, _)| row | (1 << position));
        (self.table >> row) & 1 == 1
    }

    pub fn not(&self) -> Self {
        let mut result = self.clone();
        match self.table {
            TABLE_FALSE => result.trace = vec![Token::True],
            TABLE_TRUE => result.trace = vec![Token::False],
            _ => result.trace.push(Token::Not),
        }
        result.table = !self.table;
        result
    }

    pub fn and(&self, other: &BoolFn) -> Result<Self, LogicError> {
        if self.is_false() || other.is_false() {
            return Ok(Self::constant_false());
        }
        if self.is_true() {
            return Ok(other.clone());
        }
        if other.is_true() {
            return Ok(self.clone());
        }
        self.combine(other, BinaryOp::And)
    }

    pub fn or(&self, other: &BoolFn) -> Result<Self, LogicError> {
        if self.is_true() || other.is_true() {
            return Ok(Self::constant_true());
        }
        if self.is_false() {
            return Ok(other.clone());
        }
        if other.is_false() {
            return Ok(self.clone());
        }
        self.combine(other, BinaryOp::Or)
    }

    pub fn xor(&self, other: &BoolFn) -> Result<Self, LogicError> {
        if self.is_false() {
            return Ok(other.clone());
        }
        if other.is_false() {
            return Ok(self.clone());
        }
        if self.is_true() {
            return Ok(other.not());
        }
        if other.is_true() {
            return Ok(self.not());
        }
        self.combine(other, BinaryOp::Xor)
    }

    /// Equality comparison; encoded the same way as `xor`.
    pub fn equals(&self, other: &BoolFn) -> Result<Self, LogicError> {
        self.xor(other)
    }

    /// Inequality comparison; `xor` followed by `not`.
    pub fn not_equals(&self, other: &BoolFn) -> Result<Self, LogicError> {
        Ok(self.xor(other)?.not())
    }

    /// `(self & then) | (~self & otherwise)`
    pub fn ternary(&self, then: &BoolFn, otherwise: &BoolFn) -> Result<Self, LogicError> {
        let taken = self.and(then)?;
        let not_taken = self.not().and(otherwise)?;
        taken.or(&not_taken)
    }

    fn combine(&self, other: &BoolFn, op: BinaryOp) -> Result<Self, LogicError> {
        let mut merged = self.merge(other)?;
        merged.table = op.apply(self.table, merged.table);
        merged.trace.extend_from_slice(&self.trace);
        merged.trace.push(op.token());
        log::trace!(
            "merge {:#06x} {:?} {:#06x} -> {:#06x} over {} args",
            self.table,
            op,
            other.table,
            merged.table,
            merged.args.len()
        );
        Ok(merged)
    }

    /// `other` re-expressed over the union of both argument lists.
    ///
    /// The result's arguments start with `self`'s in the same positions; new
    /// arguments of `other` are appended. `other`'s table and trace are permuted to
    /// match.
    fn merge(&self, other: &BoolFn) -> Result<Self, LogicError> {
        let mut args = self.args.clone();
        let mut table = other.table;
        let mut trace = other.trace.clone();
        // Current position of each of `other`'s arguments.
        let mut slot_of: [usize; MAX_ARGS] = [0, 1, 2, 3];

        for (k, &signal) in other.args.iter().enumerate() {
            let target = match args.iter().position(|&a| a == signal) {
                Some(position) => position,
                None if args.len() < MAX_ARGS => {
                    args.push(signal);
                    args.len() - 1
                }
                None => return Err(LogicError::TooManyArguments { limit: MAX_ARGS }),
            };

            let current = slot_of[k];
            if current == target {
                continue;
            }

            table = transpose(table, current, target);
            swap_arg_tokens(&mut trace, current, target);
            for slot in slot_of.iter_mut().skip(k + 1) {
                if *slot == target {
                    *slot = current;
                }
            }
            slot_of[k] = target;
        }

        Ok(Self { args, table, trace })
    }

    /// Postfix trace as text, e.g. `10&`.
    pub fn trace_string(&self) -> String {
        trace_string(&self.trace)
    }

    /// Fully parenthesized infix expression over the argument names.
    pub fn to_infix(&self, names: &impl SignalNames) -> String {
        let rendered = render_infix(&self.trace, |slot| {
            self.args
                .get(slot as usize)
                .and_then(|&id| names.signal_name(id))
        });
        match rendered {
            Some(text) => text,
            None => {
                log::error!("unable to render truth function {}", self);
                "UNKNOWN".to_string()
            }
        }
    }
}

fn swap_arg_tokens(trace: &mut [Token], a: usize, b: usize) {
    let (a, b) = (a as u8, b as u8);
    for token in trace.iter_mut() {
        match *token {
            Token::Arg(slot) if slot == a => *token = Token::Arg(b),
            Token::Arg(slot) if slot == b => *token = Token::Arg(a),
            _ => {}
        }
    }
}

impl fmt::Display for BoolFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TF:0x{:04X} {}", self.table, self.trace_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signal::{Behavior, DataType};

    fn bits(names: &[&str]) -> (SignalRegistry, Vec<SignalId>) {
        let mut signals = SignalRegistry::new();
        let ids = names
            .iter()
            .map(|n| signals.declare(n, Behavior::Wire, DataType::Bit).unwrap())
            .collect();
        (signals, ids)
    }

    #[test]
    fn test_constants() {
        assert!(BoolFn::constant_true().is_true());
        assert!(BoolFn::constant_false().is_false());
        assert_eq!(BoolFn::from_int(1).unwrap(), BoolFn::constant_true());
        assert_eq!(
            BoolFn::from_int(2),
            Err(LogicError::InvalidConstant { value: 2 })
        );
        assert_eq!(BoolFn::constant_true().trace_string(), "T");
    }

    #[test]
    fn test_from_signal_is_hold() {
        let (_, ids) = bits(&["a", "b"]);
        let f = BoolFn::from_signal(ids[0]);
        assert_eq!(f.table(), 0xAAAA);
        assert!(f.is_hold(ids[0]));
        assert!(!f.is_hold(ids[1]));
        assert!(!f.not().is_hold(ids[0]));
    }

    #[test]
    fn test_and_of_two_signals() {
        let (signals, ids) = bits(&["a", "b"]);
        let a = BoolFn::from_signal(ids[0]);
        let b = BoolFn::from_signal(ids[1]);

        let f = a.and(&b).unwrap();
        assert_eq!(f.args(), &[ids[0], ids[1]]);
        assert_eq!(f.table(), 0xAAAA & 0xCCCC);
        assert_eq!(f.trace_string(), "10&");
        assert_eq!(f.to_infix(&signals), "(a & b)");
    }

    #[test]
    fn test_merge_reorders_shared_arguments() {
        let (signals, ids) = bits(&["a", "b", "c"]);
        let (a, b, c) = (
            BoolFn::from_signal(ids[0]),
            BoolFn::from_signal(ids[1]),
            BoolFn::from_signal(ids[2]),
        );

        // lhs over [a, b], rhs over [c, a]: a must move from position 1 to 0.
        let lhs = a.or(&b).unwrap();
        let rhs = c.and(&a.not()).unwrap();
        let f = lhs.xor(&rhs).unwrap();
        assert_eq!(f.args(), &[ids[0], ids[1], ids[2]]);

        for row in 0..8u32 {
            let value = |id: SignalId| (row >> ids.iter().position(|&x| x == id).unwrap()) & 1 == 1;
            let (va, vb, vc) = (row & 1 == 1, row & 2 == 2, row & 4 == 4);
            assert_eq!(f.evaluate(value), (va | vb) ^ (vc & !va), "row {}", row);
        }
        assert_eq!(f.to_infix(&signals), "((a | b) ^ (c & ~a))");
    }

    #[test]
    fn test_merge_swaps_into_occupied_position() {
        // rhs over [b, a]; both already present in lhs at swapped positions.
        let (_, ids) = bits(&["a", "b"]);
        let (a, b) = (BoolFn::from_signal(ids[0]), BoolFn::from_signal(ids[1]));
        let lhs = a.xor(&b).unwrap();
        let rhs = b.and(&a.not()).unwrap();
        assert_eq!(rhs.args(), &[ids[1], ids[0]]);

        let f = lhs.or(&rhs).unwrap();
        for row in 0..4u32 {
            let (va, vb) = (row & 1 == 1, row & 2 == 2);
            let value = |id: SignalId| if id == ids[0] { va } else { vb };
            assert_eq!(f.evaluate(value), (va ^ vb) | (vb & !va));
        }
    }

    #[test]
    fn test_too_many_arguments() {
        let (_, ids) = bits(&["a", "b", "c", "d", "e"]);
        let f: Vec<_> = ids.iter().map(|&id| BoolFn::from_signal(id)).collect();
        let four = f[0].and(&f[1]).unwrap().and(&f[2]).unwrap().and(&f[3]).unwrap();
        assert_eq!(four.num_args(), 4);

        let err = four.or(&f[4]).unwrap_err();
        assert_eq!(err, LogicError::TooManyArguments { limit: 4 });
        // Operands are values; neither changed.
        assert_eq!(four.num_args(), 4);
        assert_eq!(f[4].num_args(), 1);
    }

    #[test]
    fn test_constant_shortcuts() {
        let (signals, ids) = bits(&["a"]);
        let a = BoolFn::from_signal(ids[0]);
        let t = BoolFn::constant_true();
        let z = BoolFn::constant_false();

        assert_eq!(a.and(&z).unwrap(), z);
        assert_eq!(t.and(&a).unwrap(), a);
        assert_eq!(a.or(&t).unwrap(), t);
        assert_eq!(z.or(&a).unwrap(), a);
        assert_eq!(t.xor(&a).unwrap().to_infix(&signals), "~a");
        assert_eq!(z.not().trace_string(), "T");
        assert_eq!(t.not().trace_string(), "F");
    }

    #[test]
    fn test_ternary() {
        let (signals, ids) = bits(&["s", "x", "y"]);
        let (s, x, y) = (
            BoolFn::from_signal(ids[0]),
            BoolFn::from_signal(ids[1]),
            BoolFn::from_signal(ids[2]),
        );
        let f = s.ternary(&x, &y).unwrap();
        for row in 0..8u32 {
            let (vs, vx, vy) = (row & 1 == 1, row & 2 == 2, row & 4 == 4);
            let value = |id: SignalId| match id {
                id if id == ids[0] => vs,
                id if id == ids[1] => vx,
                _ => vy,
            };
            assert_eq!(f.evaluate(value), if vs { vx } else { vy });
        }
        assert_eq!(f.to_infix(&signals), "((s & x) | (~s & y))");
    }

    #[test]
    fn test_not_equals() {
        let (_, ids) = bits(&["a", "b"]);
        let (a, b) = (BoolFn::from_signal(ids[0]), BoolFn::from_signal(ids[1]));
        assert_eq!(a.equals(&b).unwrap().table(), 0xAAAA ^ 0xCCCC);
        assert_eq!(a.not_equals(&b).unwrap().table(), !(0xAAAAu16 ^ 0xCCCC));
        assert!(a.equals(&a).unwrap().is_false());
    }

    #[test]
    fn test_display() {
        let (_, ids) = bits(&["a"]);
        let f = BoolFn::from_signal(ids[0]).not();
        assert_eq!(f.to_string(), "TF:0x5555 0~");
    }
}
