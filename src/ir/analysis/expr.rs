use super::super::func::Function;
use super::super::instruction::{Instruction, Opcode};
use super::super::value::{Constant, InstrId, Operand, ValueId};
use std::cmp::Ordering;

// An expression is eligible for canonicalization when it is pure,
// side-effect free and non-branching.
pub fn is_valid_expr(instr: &Instruction) -> bool {
    !(instr.is_void()
        || instr.is_phi()
        || instr.is_alloca()
        || instr.is_load()
        || instr.is_call()
        || instr.is_cmp())
}

// Operand classification: int literals order before float literals,
// which order before everything else. Two distinct defined values are
// never equal even when structurally identical; they compare by their
// creation-order identity.
#[derive(Debug, Clone, Copy)]
pub enum OperandKey {
    Int(i64),
    Float(f64),
    Value(ValueId),
}

impl OperandKey {
    fn of(operand: &Operand) -> Self {
        match operand {
            Operand::Const(Constant::Int(v)) => OperandKey::Int(*v),
            Operand::Const(Constant::Float(v)) => OperandKey::Float(*v),
            Operand::Value(v) => OperandKey::Value(*v),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            OperandKey::Int(_) => 1,
            OperandKey::Float(_) => 2,
            OperandKey::Value(_) => 3,
        }
    }
}

impl Ord for OperandKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (OperandKey::Int(a), OperandKey::Int(b)) => a.cmp(b),
            (OperandKey::Float(a), OperandKey::Float(b)) => a.total_cmp(b),
            (OperandKey::Value(a), OperandKey::Value(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for OperandKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OperandKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OperandKey {}

/// Ordering key over valid expressions. Two instructions compute the same
/// canonical expression iff their keys are equal; the derived order is the
/// strict weak order used by the availability sets.
///
/// Commutative binary operands are sorted at construction. Variable-arity
/// keys compare operand by operand with the strict-prefix rule, which is
/// exactly the lexicographic `Vec` ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExprKey {
    op: Opcode,
    operands: Vec<OperandKey>,
}

impl ExprKey {
    pub fn of(func: &Function, id: InstrId) -> Self {
        let instr = func.get_instr(id);
        let mut operands: Vec<OperandKey> =
            instr.get_operands().iter().map(OperandKey::of).collect();

        if instr.get_op().is_commutative() && operands.len() == 2 && operands[0] > operands[1] {
            operands.swap(0, 1);
        }

        Self {
            op: instr.get_op(),
            operands,
        }
    }
}
