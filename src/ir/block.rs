use crate::symbol_map::SymID;
use super::value::{InstrId, ValueId};
use std::collections::BTreeSet;

pub type BlockId = usize;

#[derive(Debug)]
pub struct BasicBlock {
    id: BlockId,
    name: SymID,
    instrs: Vec<InstrId>,
    successors: Vec<BlockId>,
    predecessors: Vec<BlockId>,
    // transient per-pass annotations, reset at the start of the owning pass
    live_in: BTreeSet<ValueId>,
    live_out: BTreeSet<ValueId>,
    rdoms: BTreeSet<BlockId>,
    rdom_frontier: BTreeSet<BlockId>,
}

impl BasicBlock {
    pub fn new(id: BlockId, name: SymID) -> Self {
        Self {
            id,
            name,
            instrs: vec![],
            predecessors: vec![],
            successors: vec![],
            live_in: BTreeSet::new(),
            live_out: BTreeSet::new(),
            rdoms: BTreeSet::new(),
            rdom_frontier: BTreeSet::new(),
        }
    }

    pub fn get_id(&self) -> BlockId {
        self.id
    }

    pub fn get_name(&self) -> SymID {
        self.name
    }

    pub fn get_instrs(&self) -> &Vec<InstrId> {
        &self.instrs
    }

    pub fn get_successors(&self) -> &Vec<BlockId> {
        &self.successors
    }

    pub fn get_predecessors(&self) -> &Vec<BlockId> {
        &self.predecessors
    }

    pub fn add_successor(&mut self, block_id: BlockId) {
        self.successors.push(block_id);
    }

    pub fn add_predecessor(&mut self, block_id: BlockId) {
        self.predecessors.push(block_id);
    }

    pub fn push_instr(&mut self, instr: InstrId) {
        self.instrs.push(instr);
    }

    pub fn insert_instr_front(&mut self, instr: InstrId) {
        self.instrs.insert(0, instr);
    }

    pub fn remove_instr(&mut self, instr: InstrId) {
        self.instrs.retain(|&i| i != instr);
    }

    pub fn get_live_in(&self) -> &BTreeSet<ValueId> {
        &self.live_in
    }

    pub fn get_live_out(&self) -> &BTreeSet<ValueId> {
        &self.live_out
    }

    pub fn set_live_in(&mut self, live_in: BTreeSet<ValueId>) {
        self.live_in = live_in;
    }

    pub fn set_live_out(&mut self, live_out: BTreeSet<ValueId>) {
        self.live_out = live_out;
    }

    pub fn clear_live_sets(&mut self) {
        self.live_in.clear();
        self.live_out.clear();
    }

    pub fn get_rdoms(&self) -> &BTreeSet<BlockId> {
        &self.rdoms
    }

    pub fn add_rdom(&mut self, block_id: BlockId) {
        self.rdoms.insert(block_id);
    }

    pub fn clear_rdom(&mut self) {
        self.rdoms.clear();
    }

    pub fn get_rdom_frontier(&self) -> &BTreeSet<BlockId> {
        &self.rdom_frontier
    }

    pub fn add_rdom_frontier(&mut self, block_id: BlockId) {
        self.rdom_frontier.insert(block_id);
    }

    pub fn clear_rdom_frontier(&mut self) {
        self.rdom_frontier.clear();
    }
}
