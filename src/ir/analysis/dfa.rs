use super::super::block::{BasicBlock, BlockId};
use super::super::func::Function;
use std::collections::HashMap;

// Sweep-to-fixpoint dataflow executor. Each sweep recomputes the merge
// side of every block from its identity value (init_block's merge side),
// folding in the neighboring sets, then applies the transfer function.
// Sweeps repeat until a full pass changes no in/out set; every set is
// bounded by a fixed universe, so this terminates.
pub trait Dfa: Sized {
    type Data: Clone + PartialEq;

    const BACKWARDS: bool = false;

    fn exec(&mut self, func: &Function) {
        let mut executor = DfaExecutor::<Self>::new(func);

        executor.init(self, func);
        executor.exec(self, func);

        self.complete(executor.inputs, executor.outputs);
    }

    fn init_block(&mut self, func: &Function, block: &BasicBlock) -> (Self::Data, Self::Data);
    fn merge(&mut self, block: BlockId, edge: BlockId, acc: &mut Self::Data, data: &Self::Data);
    fn transfer(&mut self, func: &Function, block: &BasicBlock, start: &Self::Data) -> Self::Data;
    fn complete(
        &mut self,
        inputs: HashMap<BlockId, Self::Data>,
        outputs: HashMap<BlockId, Self::Data>,
    );
}

struct DfaExecutor<T>
where
    T: Dfa,
{
    inputs: HashMap<BlockId, <T as Dfa>::Data>,
    outputs: HashMap<BlockId, <T as Dfa>::Data>,
    seeds: HashMap<BlockId, <T as Dfa>::Data>,
}

impl<T: Dfa> DfaExecutor<T> {
    fn new(func: &Function) -> Self {
        Self {
            inputs: HashMap::with_capacity(func.get_blocks().len()),
            outputs: HashMap::with_capacity(func.get_blocks().len()),
            seeds: HashMap::with_capacity(func.get_blocks().len()),
        }
    }

    fn init(&mut self, dfa: &mut T, func: &Function) {
        for block in func.get_blocks().iter() {
            let (input, output) = dfa.init_block(func, block);
            let seed = if T::BACKWARDS {
                output.clone()
            } else {
                input.clone()
            };

            self.seeds.insert(block.get_id(), seed);
            self.inputs.insert(block.get_id(), input);
            self.outputs.insert(block.get_id(), output);
        }
    }

    fn exec(&mut self, dfa: &mut T, func: &Function) {
        let mut changed = true;

        while changed {
            changed = false;

            for block in func.get_blocks().iter() {
                if T::BACKWARDS {
                    changed |= self.sweep_backward(dfa, func, block);
                } else {
                    changed |= self.sweep_forward(dfa, func, block);
                }
            }
        }
    }

    fn sweep_forward(&mut self, dfa: &mut T, func: &Function, block: &BasicBlock) -> bool {
        let id = block.get_id();
        let mut input = self.seeds.get(&id).unwrap().clone();

        for pred_id in block.get_predecessors().iter() {
            let pred_output = self.outputs.get(pred_id).unwrap();

            dfa.merge(id, *pred_id, &mut input, pred_output);
        }

        let output = dfa.transfer(func, block, &input);
        let changed =
            self.inputs.get(&id) != Some(&input) || self.outputs.get(&id) != Some(&output);

        self.inputs.insert(id, input);
        self.outputs.insert(id, output);

        changed
    }

    fn sweep_backward(&mut self, dfa: &mut T, func: &Function, block: &BasicBlock) -> bool {
        let id = block.get_id();
        let mut output = self.seeds.get(&id).unwrap().clone();

        for succ_id in block.get_successors().iter() {
            let succ_input = self.inputs.get(succ_id).unwrap();

            dfa.merge(id, *succ_id, &mut output, succ_input);
        }

        let input = dfa.transfer(func, block, &output);
        let changed =
            self.inputs.get(&id) != Some(&input) || self.outputs.get(&id) != Some(&output);

        self.inputs.insert(id, input);
        self.outputs.insert(id, output);

        changed
    }
}
