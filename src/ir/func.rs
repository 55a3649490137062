use crate::symbol_map::SymID;
use super::block::{BasicBlock, BlockId};
use super::instruction::{Instruction, Opcode, Ty};
use super::value::{InstrId, Operand, ValueId};
use std::ops::{Index, IndexMut};

pub const ENTRY_BLOCK_ID: usize = 0;

#[derive(Debug)]
pub struct Arg {
    name: SymID,
    uses: Vec<InstrId>,
}

impl Arg {
    pub fn new(name: SymID) -> Self {
        Self { name, uses: vec![] }
    }

    pub fn get_name(&self) -> SymID {
        self.name
    }

    pub fn get_uses(&self) -> &Vec<InstrId> {
        &self.uses
    }
}

// Instructions live in a per-function arena and are addressed by their
// slot id everywhere (operands, use lists, block bodies). Slots are
// stable; removal tombstones the slot and unlinks it from its block.
#[derive(Debug)]
pub struct Function {
    name: SymID,
    args: Vec<Arg>,
    blocks: Vec<BasicBlock>,
    instrs: Vec<Instruction>,
}

impl Function {
    pub fn new(name: SymID, args: Vec<Arg>) -> Self {
        Self {
            name,
            args,
            blocks: vec![],
            instrs: vec![],
        }
    }

    pub fn get_name(&self) -> SymID {
        self.name
    }

    pub fn get_args(&self) -> &Vec<Arg> {
        &self.args
    }

    pub fn get_blocks(&self) -> &Vec<BasicBlock> {
        &self.blocks
    }

    pub fn get_blocks_mut(&mut self) -> &mut Vec<BasicBlock> {
        &mut self.blocks
    }

    pub fn get_block(&self, block_id: BlockId) -> &BasicBlock {
        &self.blocks[block_id]
    }

    pub fn get_block_mut(&mut self, block_id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[block_id]
    }

    pub fn get_block_ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|block| block.get_id()).collect()
    }

    pub fn get_entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.get(ENTRY_BLOCK_ID)
    }

    pub fn add_block(&mut self, name: SymID) -> BlockId {
        let id = self.blocks.len();

        self.blocks.push(BasicBlock::new(id, name));

        id
    }

    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from].add_successor(to);
        self.blocks[to].add_predecessor(from);
    }

    pub fn get_instr(&self, id: InstrId) -> &Instruction {
        &self.instrs[id]
    }

    pub fn get_instr_mut(&mut self, id: InstrId) -> &mut Instruction {
        &mut self.instrs[id]
    }

    pub fn push_instr(
        &mut self,
        block: BlockId,
        op: Opcode,
        ty: Ty,
        operands: Vec<Operand>,
        name: Option<SymID>,
    ) -> InstrId {
        let id = self.instrs.len();

        for operand in operands.iter() {
            if let Some(v) = operand.value_id() {
                self.add_use(v, id);
            }
        }

        self.instrs.push(Instruction::new(op, ty, operands, block, name));
        self.blocks[block].push_instr(id);

        id
    }

    pub fn insert_phi_at_start(
        &mut self,
        block: BlockId,
        ty: Ty,
        pairs: Vec<(Operand, BlockId)>,
    ) -> InstrId {
        let (operands, incoming): (Vec<Operand>, Vec<BlockId>) = pairs.into_iter().unzip();
        let id = self.instrs.len();

        for operand in operands.iter() {
            if let Some(v) = operand.value_id() {
                self.add_use(v, id);
            }
        }

        self.instrs.push(Instruction::new_phi(ty, operands, incoming, block));
        self.blocks[block].insert_instr_front(id);

        id
    }

    pub fn uses_of(&self, value: ValueId) -> &Vec<InstrId> {
        match value {
            ValueId::Arg(i) => self.args[i].get_uses(),
            ValueId::Instr(id) => self.instrs[id].get_uses(),
        }
    }

    // Rewrites every operand slot referencing `instr`, keeping use lists
    // consistent on both sides. `instr` ends up with no uses.
    pub fn replace_all_uses(&mut self, instr: InstrId, with: Operand) {
        let mut users = std::mem::take(self.instrs[instr].get_uses_mut());
        users.sort_unstable();
        users.dedup();

        let from = Operand::Value(ValueId::Instr(instr));

        for user in users {
            let mut rewritten = 0;

            for operand in self.instrs[user].get_operands_mut() {
                if *operand == from {
                    *operand = with;
                    rewritten += 1;
                }
            }

            if let Some(v) = with.value_id() {
                for _ in 0..rewritten {
                    self.add_use(v, user);
                }
            }
        }
    }

    pub fn remove_instr(&mut self, id: InstrId) {
        let operands = self.instrs[id].get_operands().to_vec();

        for operand in operands {
            if let Some(v) = operand.value_id() {
                match v {
                    ValueId::Arg(i) => self.args[i].uses.retain(|&u| u != id),
                    ValueId::Instr(d) => self.instrs[d].get_uses_mut().retain(|&u| u != id),
                }
            }
        }

        let block = self.instrs[id].get_block();
        self.blocks[block].remove_instr(id);
        self.instrs[id].mark_removed();
    }

    fn add_use(&mut self, value: ValueId, user: InstrId) {
        match value {
            ValueId::Arg(i) => self.args[i].uses.push(user),
            ValueId::Instr(id) => self.instrs[id].get_uses_mut().push(user),
        }
    }
}

impl Index<BlockId> for Function {
    type Output = BasicBlock;

    fn index(&self, i: BlockId) -> &BasicBlock {
        &self.blocks[i]
    }
}

impl IndexMut<BlockId> for Function {
    fn index_mut(&mut self, i: BlockId) -> &mut BasicBlock {
        &mut self.blocks[i]
    }
}
