//! Resource address space of the ALU.
//!
//! Every bindable resource has a number in one flat namespace. The ranges are a
//! stable contract with code generation:
//!
//! ```text
//! 0-3     tfN_reg        condition-logic (bit) registers
//! 10-18   wordN_reg      word registers
//! 20-21   branchN        branch-condition registers
//! 22      cond_bypass
//! 23      cond_update
//! 30-42   wordN_in       word inputs
//! 50-62   carryN_in      carry (bit) inputs
//! 70-71   constN         constants (also assigned to word ins)
//! 80      builtin0       0x0000
//! 81      builtin1       0x0001
//! 82      builtinFFFF    0xFFFF
//! ```

use std::fmt;

pub const MAX_INSTRUCTIONS: usize = 8;
pub const MAX_CONDITION_LOGIC: usize = 4;
pub const MAX_WORD_REGS: usize = 9;
pub const MAX_WORD_INS: usize = 13;
pub const MAX_CARRY_INS: usize = 13;
pub const MAX_BRANCHES: usize = 2;
pub const MAX_CONSTANTS: usize = 2;
pub const MAX_NN_REGS: usize = 4;

pub const TF_REG_OFFSET: u8 = 0;
pub const WORD_REG_OFFSET: u8 = 10;
pub const BRANCH_REG_OFFSET: u8 = 20;
pub const COND_BYPASS_REG: u8 = 22;
pub const COND_UPDATE_REG: u8 = 23;
pub const WORD_IN_OFFSET: u8 = 30;
pub const CARRY_IN_OFFSET: u8 = 50;
pub const CONSTANT_REG_OFFSET: u8 = 70;
pub const BUILTIN_0_REG: u8 = 80;
pub const BUILTIN_1_REG: u8 = 81;
pub const BUILTIN_FFFF_REG: u8 = 82;

/// The resource an address names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    ConditionLogic(u8),
    WordReg(u8),
    Branch(u8),
    CondBypass,
    CondUpdate,
    WordIn(u8),
    CarryIn(u8),
    Constant(u8),
    Builtin0,
    Builtin1,
    BuiltinFFFF,
}

impl Resource {
    /// Address of the resource, or `None` when its index is past the end of its pool.
    pub fn address(self) -> Option<ResourceAddress> {
        self.in_range().then(|| self.encode())
    }

    /// Caller guarantees `in_range`.
    fn encode(self) -> ResourceAddress {
        let n = match self {
            Resource::ConditionLogic(i) => TF_REG_OFFSET + i,
            Resource::WordReg(i) => WORD_REG_OFFSET + i,
            Resource::Branch(i) => BRANCH_REG_OFFSET + i,
            Resource::CondBypass => COND_BYPASS_REG,
            Resource::CondUpdate => COND_UPDATE_REG,
            Resource::WordIn(i) => WORD_IN_OFFSET + i,
            Resource::CarryIn(i) => CARRY_IN_OFFSET + i,
            Resource::Constant(i) => CONSTANT_REG_OFFSET + i,
            Resource::Builtin0 => BUILTIN_0_REG,
            Resource::Builtin1 => BUILTIN_1_REG,
            Resource::BuiltinFFFF => BUILTIN_FFFF_REG,
        };
        ResourceAddress(n)
    }

    fn in_range(self) -> bool {
        let (index, count) = match self {
            Resource::ConditionLogic(i) => (i, MAX_CONDITION_LOGIC),
            Resource::WordReg(i) => (i, MAX_WORD_REGS),
            Resource::Branch(i) => (i, MAX_BRANCHES),
            Resource::WordIn(i) => (i, MAX_WORD_INS),
            Resource::CarryIn(i) => (i, MAX_CARRY_INS),
            Resource::Constant(i) => (i, MAX_CONSTANTS),
            _ => return true,
        };
        (index as usize) < count
    }

    /// Value driven by a builtin constant resource.
    pub fn builtin_value(self) -> Option<u16> {
        match self {
            Resource::Builtin0 => Some(0x0000),
            Resource::Builtin1 => Some(0x0001),
            Resource::BuiltinFFFF => Some(0xFFFF),
            _ => None,
        }
    }
}

/// A number in the flat resource address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceAddress(u8);

impl ResourceAddress {
    pub const COND_BYPASS: ResourceAddress = ResourceAddress(COND_BYPASS_REG);
    pub const COND_UPDATE: ResourceAddress = ResourceAddress(COND_UPDATE_REG);
    pub const BUILTIN_0: ResourceAddress = ResourceAddress(BUILTIN_0_REG);
    pub const BUILTIN_1: ResourceAddress = ResourceAddress(BUILTIN_1_REG);
    pub const BUILTIN_FFFF: ResourceAddress = ResourceAddress(BUILTIN_FFFF_REG);

    /// Checked construction from a raw number.
    pub fn new(number: u8) -> Option<Self> {
        let addr = ResourceAddress(number);
        addr.resource().map(|_| addr)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn condition_logic(index: usize) -> Self {
        debug_assert!(index < MAX_CONDITION_LOGIC);
        Resource::ConditionLogic(index as u8).encode()
    }

    pub fn word_reg(index: usize) -> Self {
        debug_assert!(index < MAX_WORD_REGS);
        Resource::WordReg(index as u8).encode()
    }

    pub fn branch(index: usize) -> Self {
        debug_assert!(index < MAX_BRANCHES);
        Resource::Branch(index as u8).encode()
    }

    pub fn word_in(index: usize) -> Self {
        debug_assert!(index < MAX_WORD_INS);
        Resource::WordIn(index as u8).encode()
    }

    pub fn carry_in(index: usize) -> Self {
        debug_assert!(index < MAX_CARRY_INS);
        Resource::CarryIn(index as u8).encode()
    }

    pub fn constant(index: usize) -> Self {
        debug_assert!(index < MAX_CONSTANTS);
        Resource::Constant(index as u8).encode()
    }

    /// Decode the address into the resource it names.
    pub fn resource(self) -> Option<Resource> {
        let n = self.0;
        let in_range = |offset: u8, count: usize| n >= offset && ((n - offset) as usize) < count;

        if in_range(TF_REG_OFFSET, MAX_CONDITION_LOGIC) {
            Some(Resource::ConditionLogic(n - TF_REG_OFFSET))
        } else if in_range(WORD_REG_OFFSET, MAX_WORD_REGS) {
            Some(Resource::WordReg(n - WORD_REG_OFFSET))
        } else if in_range(BRANCH_REG_OFFSET, MAX_BRANCHES) {
            Some(Resource::Branch(n - BRANCH_REG_OFFSET))
        } else if n == COND_BYPASS_REG {
            Some(Resource::CondBypass)
        } else if n == COND_UPDATE_REG {
            Some(Resource::CondUpdate)
        } else if in_range(WORD_IN_OFFSET, MAX_WORD_INS) {
            Some(Resource::WordIn(n - WORD_IN_OFFSET))
        } else if in_range(CARRY_IN_OFFSET, MAX_CARRY_INS) {
            Some(Resource::CarryIn(n - CARRY_IN_OFFSET))
        } else if in_range(CONSTANT_REG_OFFSET, MAX_CONSTANTS) {
            Some(Resource::Constant(n - CONSTANT_REG_OFFSET))
        } else {
            match n {
                BUILTIN_0_REG => Some(Resource::Builtin0),
                BUILTIN_1_REG => Some(Resource::Builtin1),
                BUILTIN_FFFF_REG => Some(Resource::BuiltinFFFF),
                _ => None,
            }
        }
    }

    pub fn is_word_in(self) -> bool {
        matches!(self.resource(), Some(Resource::WordIn(_)))
    }

    pub fn is_word_reg(self) -> bool {
        matches!(self.resource(), Some(Resource::WordReg(_)))
    }

    /// Name used in diagnostics and generated code, e.g. `word0_reg`.
    pub fn name(self) -> String {
        match self.resource() {
            Some(Resource::ConditionLogic(i)) => format!("tf{}_reg", i),
            Some(Resource::WordReg(i)) => format!("word{}_reg", i),
            Some(Resource::Branch(i)) => format!("branch{}", i),
            Some(Resource::CondBypass) => "cond_bypass".to_string(),
            Some(Resource::CondUpdate) => "cond_update".to_string(),
            Some(Resource::WordIn(i)) => format!("word{}_in", i),
            Some(Resource::CarryIn(i)) => format!("carry{}_in", i),
            Some(Resource::Constant(i)) => format!("const{}", i),
            Some(Resource::Builtin0) => "builtin0".to_string(),
            Some(Resource::Builtin1) => "builtin1".to_string(),
            Some(Resource::BuiltinFFFF) => "builtinFFFF".to_string(),
            None => format!("unknown{}", self.0),
        }
    }

    /// Inverse of [`ResourceAddress::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        let fixed = match name {
            "cond_bypass" => Some(Resource::CondBypass),
            "cond_update" => Some(Resource::CondUpdate),
            "builtin0" => Some(Resource::Builtin0),
            "builtin1" => Some(Resource::Builtin1),
            "builtinFFFF" => Some(Resource::BuiltinFFFF),
            _ => None,
        };
        if let Some(resource) = fixed {
            return resource.address();
        }

        let indexed = |prefix: &str, suffix: &str| -> Option<u8> {
            let digits = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()
        };

        let resource = if let Some(i) = indexed("tf", "_reg") {
            Resource::ConditionLogic(i)
        } else if let Some(i) = indexed("word", "_reg") {
            Resource::WordReg(i)
        } else if let Some(i) = indexed("word", "_in") {
            Resource::WordIn(i)
        } else if let Some(i) = indexed("carry", "_in") {
            Resource::CarryIn(i)
        } else if let Some(i) = indexed("branch", "") {
            Resource::Branch(i)
        } else if let Some(i) = indexed("const", "") {
            Resource::Constant(i)
        } else {
            return None;
        };

        resource.address()
    }

    /// Every valid address in ascending order.
    pub fn all() -> impl Iterator<Item = ResourceAddress> {
        (0..=u8::MAX).filter_map(ResourceAddress::new)
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_number() {
        assert_eq!(ResourceAddress::new(10).unwrap().name(), "word0_reg");
        assert_eq!(ResourceAddress::new(3).unwrap().name(), "tf3_reg");
        assert_eq!(ResourceAddress::new(21).unwrap().name(), "branch1");
        assert_eq!(ResourceAddress::new(42).unwrap().name(), "word12_in");
        assert_eq!(ResourceAddress::new(50).unwrap().name(), "carry0_in");
        assert_eq!(ResourceAddress::new(71).unwrap().name(), "const1");
        assert_eq!(ResourceAddress::new(82).unwrap().name(), "builtinFFFF");
    }

    #[test]
    fn test_gaps_are_invalid() {
        for n in [4, 9, 19, 24, 29, 43, 49, 63, 69, 72, 79, 83, 255] {
            assert_eq!(ResourceAddress::new(n), None, "address {n} should be invalid");
        }
    }

    #[test]
    fn test_number_from_name() {
        assert_eq!(ResourceAddress::from_name("word0_reg").map(|a| a.number()), Some(10));
        assert_eq!(ResourceAddress::from_name("cond_update").map(|a| a.number()), Some(23));
        assert_eq!(ResourceAddress::from_name("carry12_in").map(|a| a.number()), Some(62));
        assert_eq!(ResourceAddress::from_name("word9_reg"), None);
        assert_eq!(ResourceAddress::from_name("word13_in"), None);
        assert_eq!(ResourceAddress::from_name("word_reg"), None);
        assert_eq!(ResourceAddress::from_name("branch+1"), None);
        assert_eq!(ResourceAddress::from_name("word250_reg"), None);
    }

    #[test]
    fn test_names_round_trip_over_whole_space() {
        let all: Vec<_> = ResourceAddress::all().collect();
        assert_eq!(all.len(), 4 + 9 + 2 + 1 + 1 + 13 + 13 + 2 + 3);
        for addr in all {
            assert_eq!(ResourceAddress::from_name(&addr.name()), Some(addr));
        }
    }

    #[test]
    fn test_builtin_values() {
        assert_eq!(Resource::BuiltinFFFF.builtin_value(), Some(0xFFFF));
        assert_eq!(Resource::WordReg(0).builtin_value(), None);
    }

    #[test]
    fn test_out_of_pool_resource_has_no_address() {
        assert_eq!(Resource::WordIn(250).address(), None);
        assert_eq!(Resource::ConditionLogic(4).address(), None);
        assert_eq!(Resource::Constant(255).address(), None);
        assert_eq!(Resource::WordIn(12).address(), ResourceAddress::new(42));
        assert_eq!(Resource::Builtin0.address(), Some(ResourceAddress::BUILTIN_0));
        assert_eq!(Resource::CondUpdate.address(), Some(ResourceAddress::COND_UPDATE));
    }
}
