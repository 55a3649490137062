use crate::symbol_map::SymbolMap;
use super::block::BlockId;
use super::func::{Arg, Function};
use super::instruction::{CmpPred, Opcode, Ty};
use super::value::{Constant, InstrId, Operand, ValueId};

// Constructs already-valid SSA functions: instructions go through the
// arena so use lists stay consistent, and CFG edges are linked where the
// terminators are emitted.
pub struct FuncBuilder<'a> {
    func: Function,
    syms: &'a mut SymbolMap,
    current: Option<BlockId>,
}

impl<'a> FuncBuilder<'a> {
    pub fn new(name: &str, args: &[&str], syms: &'a mut SymbolMap) -> Self {
        let name = syms.get_id(name);
        let args = args.iter().map(|a| Arg::new(syms.get_id(a))).collect();

        Self {
            func: Function::new(name, args),
            syms,
            current: None,
        }
    }

    pub fn build(self) -> Function {
        self.func
    }

    pub fn block(&mut self, name: &str) -> BlockId {
        let id = self.func.add_block(self.syms.get_id(name));

        if self.current.is_none() {
            self.current = Some(id);
        }

        id
    }

    pub fn select(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    pub fn arg(&self, index: usize) -> Operand {
        Operand::Value(ValueId::Arg(index))
    }

    pub fn int(value: i64) -> Operand {
        Operand::Const(Constant::Int(value))
    }

    pub fn float(value: f64) -> Operand {
        Operand::Const(Constant::Float(value))
    }

    pub fn binary(&mut self, op: Opcode, lhs: Operand, rhs: Operand) -> Operand {
        let ty = match op {
            Opcode::FAdd | Opcode::FSub | Opcode::FMul | Opcode::FDiv => Ty::Float,
            _ => Ty::Int,
        };

        self.emit(op, ty, vec![lhs, rhs])
    }

    pub fn offset(&mut self, base: Operand, indices: Vec<Operand>) -> Operand {
        let mut operands = vec![base];
        operands.extend(indices);

        self.emit(Opcode::Offset, Ty::Ptr, operands)
    }

    pub fn int_to_float(&mut self, value: Operand) -> Operand {
        self.emit(Opcode::IntToFloat, Ty::Float, vec![value])
    }

    pub fn float_to_int(&mut self, value: Operand) -> Operand {
        self.emit(Opcode::FloatToInt, Ty::Int, vec![value])
    }

    pub fn cmp(&mut self, pred: CmpPred, lhs: Operand, rhs: Operand) -> Operand {
        self.emit(Opcode::Cmp(pred), Ty::Int, vec![lhs, rhs])
    }

    pub fn fcmp(&mut self, pred: CmpPred, lhs: Operand, rhs: Operand) -> Operand {
        self.emit(Opcode::FCmp(pred), Ty::Int, vec![lhs, rhs])
    }

    pub fn alloca(&mut self) -> Operand {
        self.emit(Opcode::Alloca, Ty::Ptr, vec![])
    }

    pub fn load(&mut self, addr: Operand) -> Operand {
        self.emit(Opcode::Load, Ty::Int, vec![addr])
    }

    pub fn store(&mut self, value: Operand, addr: Operand) {
        self.emit(Opcode::Store, Ty::Void, vec![value, addr]);
    }

    pub fn call(&mut self, callee: &str, args: Vec<Operand>, ty: Ty) -> Operand {
        let callee = self.syms.get_id(callee);

        self.emit(Opcode::Call(callee), ty, args)
    }

    pub fn phi(&mut self, pairs: Vec<(Operand, BlockId)>) -> Operand {
        let ty = pairs
            .first()
            .map(|(operand, _)| self.operand_ty(operand))
            .unwrap_or(Ty::Int);
        let id = self.func.insert_phi_at_start(self.current.unwrap(), ty, pairs);

        Operand::Value(ValueId::Instr(id))
    }

    pub fn ret(&mut self, value: Option<Operand>) {
        let operands = value.into_iter().collect();

        self.emit(Opcode::Ret, Ty::Void, operands);
    }

    pub fn br(&mut self, target: BlockId) {
        let from = self.current.unwrap();

        self.emit(Opcode::Br, Ty::Void, vec![]);
        self.func.add_edge(from, target);
    }

    pub fn cond_br(&mut self, cond: Operand, then_block: BlockId, else_block: BlockId) {
        let from = self.current.unwrap();

        self.emit(Opcode::Br, Ty::Void, vec![cond]);
        self.func.add_edge(from, then_block);
        self.func.add_edge(from, else_block);
    }

    pub fn set_name(&mut self, value: Operand, name: &str) {
        let id = self.syms.get_id(name);

        if let Some(ValueId::Instr(instr)) = value.value_id() {
            self.func.get_instr_mut(instr).set_name(id);
        }
    }

    pub fn instr_id(value: Operand) -> InstrId {
        match value.value_id() {
            Some(ValueId::Instr(id)) => id,
            _ => panic!("operand is not an instruction"),
        }
    }

    fn emit(&mut self, op: Opcode, ty: Ty, operands: Vec<Operand>) -> Operand {
        let block = self.current.unwrap();
        let id = self.func.push_instr(block, op, ty, operands, None);

        Operand::Value(ValueId::Instr(id))
    }

    fn operand_ty(&self, operand: &Operand) -> Ty {
        match operand {
            Operand::Const(Constant::Int(_)) => Ty::Int,
            Operand::Const(Constant::Float(_)) => Ty::Float,
            Operand::Value(ValueId::Arg(_)) => Ty::Int,
            Operand::Value(ValueId::Instr(id)) => self.func.get_instr(*id).get_ty(),
        }
    }
}
