use crate::error::PassError;
use crate::symbol_map::SymbolMap;
use super::super::analysis::{is_valid_expr, Dfa, ExprKey};
use super::super::block::{BasicBlock, BlockId};
use super::super::func::{Function, ENTRY_BLOCK_ID};
use super::super::module::Module;
use super::super::value::{InstrId, Operand, ValueId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Global common subexpression elimination over available expressions.
///
/// SSA means an expression, once computed, stays available on every path
/// that keeps its operands' defining region, so no kill sets exist.
/// Analysis runs to completion before any rewriting starts; redundant
/// instructions are unlinked only after every block has been scanned.
pub fn eliminate_common_subexprs(module: &mut Module) -> Result<(), PassError> {
    let Module { funcs, syms } = module;

    for func in funcs.iter_mut() {
        if func.get_blocks().is_empty() {
            continue;
        }

        let mut cse = Cse::new();

        cse.compute_local_gen(func);
        cse.exec(func);
        cse.eliminate(func, syms)?;
    }

    Ok(())
}

struct Cse {
    // every candidate expression seen so far, deduplicated by key
    pool: BTreeSet<ExprKey>,
    gen: HashMap<BlockId, BTreeSet<ExprKey>>,
    bb_in: HashMap<BlockId, BTreeSet<ExprKey>>,
    resolved: BTreeMap<(BlockId, ExprKey), InstrId>,
}

impl Cse {
    fn new() -> Self {
        Self {
            pool: BTreeSet::new(),
            gen: HashMap::new(),
            bb_in: HashMap::new(),
            resolved: BTreeMap::new(),
        }
    }

    fn compute_local_gen(&mut self, func: &Function) {
        for block in func.get_blocks().iter() {
            let gen = self.gen.entry(block.get_id()).or_default();

            for &instr_id in block.get_instrs().iter() {
                if !is_valid_expr(func.get_instr(instr_id)) {
                    continue;
                }

                let key = ExprKey::of(func, instr_id);

                gen.insert(key.clone());
                self.pool.insert(key);
            }
        }
    }

    // One block-local running set per block, in program order: an
    // expression available on entry resolves to its reaching definition,
    // a same-key earlier instruction in the block wins otherwise, and
    // anything else registers as the representative of its key.
    fn eliminate(&mut self, func: &mut Function, syms: &SymbolMap) -> Result<(), PassError> {
        let mut deleted: Vec<InstrId> = vec![];

        for block_id in func.get_block_ids() {
            let mut block_exprs: BTreeMap<ExprKey, InstrId> = BTreeMap::new();
            let instr_ids = func.get_block(block_id).get_instrs().to_vec();

            for instr_id in instr_ids {
                if !is_valid_expr(func.get_instr(instr_id)) {
                    continue;
                }

                let key = ExprKey::of(func, instr_id);

                if self.pool.contains(&key) && self.bb_in.get(&block_id).unwrap().contains(&key) {
                    let def = self.resolve(func, block_id, &key).ok_or_else(|| {
                        PassError::NoReachingDef {
                            func: syms.get_str(func.get_name()).to_string(),
                        }
                    })?;

                    func.replace_all_uses(instr_id, Operand::Value(ValueId::Instr(def)));
                    deleted.push(instr_id);
                } else if let Some(&earlier) = block_exprs.get(&key) {
                    func.replace_all_uses(instr_id, Operand::Value(ValueId::Instr(earlier)));
                    deleted.push(instr_id);
                } else {
                    block_exprs.insert(key.clone(), instr_id);
                    self.pool.insert(key);
                }
            }
        }

        for instr_id in deleted {
            func.remove_instr(instr_id);
        }

        Ok(())
    }

    // Depth-first over predecessors with a per-call visited set. A
    // predecessor that generates the key without receiving it supplies
    // its representative instruction; otherwise the key only reaches it
    // by propagation and the search continues upward. Several distinct
    // reaching values merge through a fresh phi at the requesting block.
    fn resolve(&mut self, func: &mut Function, origin: BlockId, key: &ExprKey) -> Option<InstrId> {
        if let Some(&def) = self.resolved.get(&(origin, key.clone())) {
            return Some(def);
        }

        let mut visited: HashSet<BlockId> = HashSet::from([origin]);
        let mut stack = vec![Frame::new(origin)];

        loop {
            let (block, next) = {
                let frame = stack.last().unwrap();
                (frame.block, frame.next)
            };
            let preds = func.get_block(block).get_predecessors();

            if next < preds.len() {
                let pred = preds[next];
                stack.last_mut().unwrap().next += 1;

                if visited.contains(&pred) {
                    continue;
                }

                let generated = !self.bb_in.get(&pred).unwrap().contains(key)
                    && self.gen.get(&pred).unwrap().contains(key);

                if generated {
                    if let Some(repr) = find_representative(func, pred, key) {
                        visited.insert(pred);
                        stack.last_mut().unwrap().defs.entry(repr).or_insert(pred);
                    }
                } else {
                    visited.insert(pred);
                    stack.push(Frame::new(pred));
                }
            } else {
                let done = stack.pop().unwrap();
                let block = done.block;
                let result = match done.defs.len() {
                    0 => None,
                    1 => done.defs.keys().next().copied(),
                    _ => Some(synthesize_merge(func, block, done.defs)),
                };

                match stack.last_mut() {
                    Some(parent) => {
                        if let Some(def) = result {
                            parent.defs.entry(def).or_insert(block);
                        }
                    }
                    None => {
                        if let Some(def) = result {
                            self.resolved.insert((origin, key.clone()), def);
                        }

                        return result;
                    }
                }
            }
        }
    }
}

struct Frame {
    block: BlockId,
    next: usize,
    // distinct reaching values; the first predecessor to report one wins
    defs: BTreeMap<InstrId, BlockId>,
}

impl Frame {
    fn new(block: BlockId) -> Self {
        Self {
            block,
            next: 0,
            defs: BTreeMap::new(),
        }
    }
}

fn find_representative(func: &Function, block: BlockId, key: &ExprKey) -> Option<InstrId> {
    for &instr_id in func.get_block(block).get_instrs().iter() {
        if !is_valid_expr(func.get_instr(instr_id)) {
            continue;
        }

        if ExprKey::of(func, instr_id) == *key {
            return Some(instr_id);
        }
    }

    None
}

fn synthesize_merge(func: &mut Function, block: BlockId, defs: BTreeMap<InstrId, BlockId>) -> InstrId {
    let ty = func.get_instr(*defs.keys().next().unwrap()).get_ty();
    let pairs = defs
        .into_iter()
        .map(|(def, pred)| (Operand::Value(ValueId::Instr(def)), pred))
        .collect();

    func.insert_phi_at_start(block, ty, pairs)
}

impl Dfa for Cse {
    type Data = BTreeSet<ExprKey>;

    fn init_block(&mut self, _func: &Function, block: &BasicBlock) -> (Self::Data, Self::Data) {
        // availability starts at the full pool everywhere except the
        // entry, whose input is always empty
        let input = if block.get_id() == ENTRY_BLOCK_ID {
            BTreeSet::new()
        } else {
            self.pool.clone()
        };

        (input, self.pool.clone())
    }

    fn merge(&mut self, _block: BlockId, _pred: BlockId, acc: &mut Self::Data, pred_out: &Self::Data) {
        acc.retain(|key| pred_out.contains(key));
    }

    fn transfer(&mut self, _func: &Function, block: &BasicBlock, input: &Self::Data) -> Self::Data {
        let mut output = input.clone();

        output.extend(self.gen.get(&block.get_id()).unwrap().iter().cloned());

        output
    }

    fn complete(
        &mut self,
        inputs: HashMap<BlockId, Self::Data>,
        _outputs: HashMap<BlockId, Self::Data>,
    ) {
        self.bb_in = inputs;
    }
}
