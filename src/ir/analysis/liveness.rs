use crate::symbol_map::SymbolMap;
use super::super::block::{BasicBlock, BlockId};
use super::super::func::Function;
use super::super::module::Module;
use super::super::value::ValueId;
use super::dfa::Dfa;
use std::collections::{BTreeSet, HashMap};

// Backward liveness over named SSA values. A phi's i-th operand is a use
// belonging to the i-th incoming edge, so its liveness must only flow
// into the matching predecessor; `sources` records, per (block, value),
// which blocks a value's liveness is attributable to, and the out-merge
// admits a value from a successor only when that attribution involves
// the edge being crossed.
pub struct LiveVarAnalysis {
    live_in: HashMap<BlockId, BTreeSet<ValueId>>,
    live_out: HashMap<BlockId, BTreeSet<ValueId>>,
    defs: HashMap<BlockId, BTreeSet<ValueId>>,
    uses: HashMap<BlockId, BTreeSet<ValueId>>,
    sources: HashMap<BlockId, HashMap<ValueId, BTreeSet<BlockId>>>,
}

impl LiveVarAnalysis {
    pub fn new() -> Self {
        Self {
            live_in: HashMap::new(),
            live_out: HashMap::new(),
            defs: HashMap::new(),
            uses: HashMap::new(),
            sources: HashMap::new(),
        }
    }

    pub fn run(&mut self, func: &mut Function) {
        for block in func.get_blocks_mut().iter_mut() {
            block.clear_live_sets();
        }

        self.exec(func);

        for block in func.get_blocks_mut().iter_mut() {
            let id = block.get_id();

            block.set_live_in(self.live_in.get(&id).unwrap().clone());
            block.set_live_out(self.live_out.get(&id).unwrap().clone());
        }
    }

    pub fn is_live_on_entry(&self, block_id: BlockId, value: &ValueId) -> bool {
        self.live_in.get(&block_id).unwrap().contains(value)
    }

    pub fn get_live_out(&self, block_id: BlockId) -> &BTreeSet<ValueId> {
        self.live_out.get(&block_id).unwrap()
    }
}

impl Default for LiveVarAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

impl Dfa for LiveVarAnalysis {
    const BACKWARDS: bool = true;

    type Data = BTreeSet<ValueId>;

    fn init_block(&mut self, func: &Function, block: &BasicBlock) -> (Self::Data, Self::Data) {
        let id = block.get_id();
        let mut defined: BTreeSet<ValueId> = BTreeSet::new();
        let mut used: BTreeSet<ValueId> = BTreeSet::new();
        let sources = self.sources.entry(id).or_default();

        for &instr_id in block.get_instrs().iter() {
            let instr = func.get_instr(instr_id);

            if instr.is_phi() {
                for (operand, pred) in instr.get_operands().iter().zip(instr.get_incoming()) {
                    if let Some(v) = operand.value_id() {
                        sources.entry(v).or_default().insert(*pred);
                        used.insert(v);
                    }
                }
            } else {
                for operand in instr.get_operands().iter() {
                    if let Some(v) = operand.value_id() {
                        if !defined.contains(&v) {
                            sources.entry(v).or_default().insert(id);
                            used.insert(v);
                        }
                    }
                }
            }

            if !instr.is_void() {
                defined.insert(ValueId::Instr(instr_id));
            }
        }

        self.defs.insert(id, defined);
        self.uses.insert(id, used);

        (BTreeSet::new(), BTreeSet::new())
    }

    fn merge(&mut self, block: BlockId, succ: BlockId, acc: &mut Self::Data, succ_in: &Self::Data) {
        for v in succ_in.iter() {
            let keep = match self.sources.get(&succ).and_then(|from| from.get(v)) {
                // no recorded origin, keep it conservatively
                None => true,
                Some(from) => from.contains(&block) || from.contains(&succ),
            };

            if keep {
                acc.insert(*v);
            }
        }
    }

    fn transfer(&mut self, _func: &Function, block: &BasicBlock, live_out: &Self::Data) -> Self::Data {
        let id = block.get_id();
        let defs = self.defs.get(&id).unwrap();
        let mut live_in = self.uses.get(&id).unwrap().clone();
        let sources = self.sources.get_mut(&id).unwrap();

        // LIVE IN = USES + LIVE OUT VARS THAT WEREN'T DEFINED
        for v in live_out.difference(defs) {
            sources.entry(*v).or_default().insert(id);
            live_in.insert(*v);
        }

        live_in
    }

    fn complete(
        &mut self,
        inputs: HashMap<BlockId, Self::Data>,
        outputs: HashMap<BlockId, Self::Data>,
    ) {
        self.live_in = inputs;
        self.live_out = outputs;
    }
}

/// Annotates every function's blocks with live-in/live-out sets and
/// returns the report: per block, its name, `in:` and the sorted
/// space-separated live-in names, then `out:` likewise. Anonymous values
/// are omitted. The text is stable across runs.
pub fn live_var_pass(module: &mut Module) -> String {
    let mut report = String::new();
    let Module { funcs, syms } = module;

    for func in funcs.iter_mut() {
        if func.get_blocks().is_empty() {
            continue;
        }

        let mut analysis = LiveVarAnalysis::new();
        analysis.run(func);

        dump(func, syms, &mut report);
    }

    report
}

fn dump(func: &Function, syms: &SymbolMap, out: &mut String) {
    for block in func.get_blocks().iter() {
        out.push_str(syms.get_str(block.get_name()));
        out.push('\n');

        out.push_str("in:\n");
        for name in sorted_names(func, syms, block.get_live_in()) {
            out.push_str(name);
            out.push(' ');
        }
        out.push('\n');

        out.push_str("out:\n");
        for name in sorted_names(func, syms, block.get_live_out()) {
            out.push_str(name);
            out.push(' ');
        }
        out.push('\n');
    }
}

fn sorted_names<'s>(
    func: &Function,
    syms: &'s SymbolMap,
    values: &BTreeSet<ValueId>,
) -> Vec<&'s str> {
    let mut names: Vec<&str> = values
        .iter()
        .filter_map(|v| value_name(func, syms, v))
        .collect();

    names.sort_unstable();

    names
}

fn value_name<'s>(func: &Function, syms: &'s SymbolMap, value: &ValueId) -> Option<&'s str> {
    match value {
        ValueId::Arg(i) => Some(syms.get_str(func.get_args()[*i].get_name())),
        ValueId::Instr(id) => func.get_instr(*id).get_name().map(|name| syms.get_str(name)),
    }
}
