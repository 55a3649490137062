use crate::error::PassError;
use crate::symbol_map::SymbolMap;
use super::super::block::BlockId;
use super::super::func::Function;
use super::super::module::Module;
use std::collections::{HashMap, HashSet};

/// Builds the reverse dominator tree and reverse dominance frontier of
/// every function, leaving the results as per-block `rdoms` and
/// `rdom_frontier` annotations. Requires exactly one `ret`-terminated
/// exit block per function; a malformed CFG aborts the pass with no
/// partial tree published.
pub fn rdom_tree_pass(module: &mut Module) -> Result<(), PassError> {
    let Module { funcs, syms } = module;

    for func in funcs.iter_mut() {
        if func.get_blocks().is_empty() {
            continue;
        }

        for block in func.get_blocks_mut().iter_mut() {
            block.clear_rdom();
            block.clear_rdom_frontier();
        }

        RDomTree::compute(func, syms)?.annotate(func);
    }

    Ok(())
}

struct RDomTree {
    exit: BlockId,
    // post-order finish index per backward-reachable block; the exit
    // always numbers last
    number: HashMap<BlockId, usize>,
    post_order: Vec<BlockId>,
    // immediate reverse dominator, indexed by number
    irdoms: Vec<Option<BlockId>>,
}

impl RDomTree {
    fn compute(func: &Function, syms: &SymbolMap) -> Result<Self, PassError> {
        let exit = find_exit(func, syms)?;
        let (number, post_order) = number_from_exit(func, exit);
        let mut this = Self {
            exit,
            number,
            post_order,
            irdoms: vec![],
        };

        this.compute_irdoms(func);

        Ok(this)
    }

    // Post-order DFS from the exit along predecessor edges. Blocks that
    // cannot reach the exit are never numbered and the rest of the pass
    // skips them entirely.
    fn compute_irdoms(&mut self, func: &Function) {
        self.irdoms = vec![None; self.post_order.len()];
        self.irdoms[self.number[&self.exit]] = Some(self.exit);

        let mut rpo = self.post_order.clone();
        rpo.reverse();

        let mut changed = true;
        while changed {
            changed = false;

            for &block in rpo.iter() {
                if block == self.exit {
                    continue;
                }

                let mut new_irdom: Option<BlockId> = None;

                // reverse-predecessors are the original successors
                for &rpred in func.get_block(block).get_successors().iter() {
                    let Some(&n) = self.number.get(&rpred) else {
                        continue;
                    };

                    if self.irdoms[n].is_some() {
                        new_irdom = Some(match new_irdom {
                            None => rpred,
                            Some(current) => self.intersect(rpred, current),
                        });
                    }
                }

                let slot = self.number[&block];
                if self.irdoms[slot] != new_irdom {
                    self.irdoms[slot] = new_irdom;
                    changed = true;
                }
            }
        }
    }

    // Two-finger walk up the partial tree, using the post-order numbers
    // as the ancestorship oracle.
    fn intersect(&self, b1: BlockId, b2: BlockId) -> BlockId {
        let mut finger1 = b1;
        let mut finger2 = b2;

        while finger1 != finger2 {
            while self.number[&finger1] < self.number[&finger2] {
                finger1 = self.irdoms[self.number[&finger1]].unwrap();
            }
            while self.number[&finger2] < self.number[&finger1] {
                finger2 = self.irdoms[self.number[&finger2]].unwrap();
            }
        }

        finger1
    }

    fn irdom(&self, block: BlockId) -> Option<BlockId> {
        self.irdoms[self.number[&block]]
    }

    fn annotate(&self, func: &mut Function) {
        self.annotate_rdoms(func);
        self.annotate_frontiers(func);
    }

    // Every numbered block walks its irdom chain up to and including the
    // exit, recording each visited block in its own set.
    fn annotate_rdoms(&self, func: &mut Function) {
        for &block in self.post_order.iter() {
            let mut current = block;

            loop {
                func.get_block_mut(block).add_rdom(current);

                if current == self.exit {
                    break;
                }

                current = self.irdom(current).unwrap();
            }
        }
    }

    // A block with two or more reverse-predecessors ends somebody's
    // reverse dominance: walk each original successor's irdom chain up
    // to (excluding) the block's own irdom, tagging the frontier sets
    // along the way.
    fn annotate_frontiers(&self, func: &mut Function) {
        let block_ids = func.get_block_ids();

        for &block in block_ids.iter().rev() {
            if !self.number.contains_key(&block) {
                continue;
            }

            let rpreds = func.get_block(block).get_successors().to_vec();
            if rpreds.len() < 2 {
                continue;
            }

            let stop = self.irdom(block);

            for rpred in rpreds {
                if !self.number.contains_key(&rpred) {
                    continue;
                }

                let mut runner = rpred;

                while Some(runner) != stop {
                    func.get_block_mut(runner).add_rdom_frontier(block);
                    runner = self.irdom(runner).unwrap();
                }
            }
        }
    }
}

fn find_exit(func: &Function, syms: &SymbolMap) -> Result<BlockId, PassError> {
    let mut exit = None;

    for block in func.get_blocks().iter() {
        let is_exit = block
            .get_instrs()
            .last()
            .map(|&id| func.get_instr(id).is_ret())
            .unwrap_or(false);

        if is_exit {
            if exit.is_some() {
                return Err(PassError::MultipleExits {
                    func: syms.get_str(func.get_name()).to_string(),
                });
            }

            exit = Some(block.get_id());
        }
    }

    exit.ok_or_else(|| PassError::MissingExit {
        func: syms.get_str(func.get_name()).to_string(),
    })
}

fn number_from_exit(func: &Function, exit: BlockId) -> (HashMap<BlockId, usize>, Vec<BlockId>) {
    let mut number = HashMap::new();
    let mut post_order = vec![];
    let mut visited: HashSet<BlockId> = HashSet::from([exit]);
    let mut stack: Vec<(BlockId, usize)> = vec![(exit, 0)];

    while let Some(&(block, next)) = stack.last() {
        let preds = func.get_block(block).get_predecessors();

        if next < preds.len() {
            let pred = preds[next];

            stack.last_mut().unwrap().1 += 1;

            if visited.insert(pred) {
                stack.push((pred, 0));
            }
        } else {
            stack.pop();
            number.insert(block, post_order.len());
            post_order.push(block);
        }
    }

    (number, post_order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::super::func_builder::FuncBuilder;
    use super::super::super::instruction::CmpPred;
    use std::collections::BTreeSet;

    fn diamond() -> Module {
        let mut module = Module::new();
        let mut builder = FuncBuilder::new("f", &["a", "b"], &mut module.syms);

        let entry = builder.block("entry");
        let left = builder.block("left");
        let right = builder.block("right");
        let exit = builder.block("exit");

        builder.select(entry);
        let cond = builder.cmp(CmpPred::Lt, builder.arg(0), builder.arg(1));
        builder.cond_br(cond, left, right);

        builder.select(left);
        builder.br(exit);

        builder.select(right);
        builder.br(exit);

        builder.select(exit);
        builder.ret(Some(builder.arg(0)));

        let built = builder.build();

        module.add_function(built);

        module
    }

    fn rdoms(module: &Module, block: BlockId) -> BTreeSet<BlockId> {
        module.funcs[0].get_block(block).get_rdoms().clone()
    }

    #[test]
    fn diamond_rdom_sets() {
        let mut module = diamond();

        rdom_tree_pass(&mut module).unwrap();

        let (entry, left, right, exit) = (0, 1, 2, 3);

        assert_eq!(rdoms(&module, exit), BTreeSet::from([exit]));
        assert_eq!(rdoms(&module, left), BTreeSet::from([left, exit]));
        assert_eq!(rdoms(&module, right), BTreeSet::from([right, exit]));
        assert_eq!(rdoms(&module, entry), BTreeSet::from([entry, exit]));
    }

    #[test]
    fn diamond_rdom_frontiers() {
        let mut module = diamond();

        rdom_tree_pass(&mut module).unwrap();

        let (entry, left, right, exit) = (0, 1, 2, 3);
        let func = &module.funcs[0];

        // entry has two reverse-predecessors; the runner walks from left
        // and right stop before entry's irdom (exit)
        assert_eq!(func.get_block(left).get_rdom_frontier(), &BTreeSet::from([entry]));
        assert_eq!(func.get_block(right).get_rdom_frontier(), &BTreeSet::from([entry]));
        assert_eq!(func.get_block(entry).get_rdom_frontier(), &BTreeSet::new());
        assert_eq!(func.get_block(exit).get_rdom_frontier(), &BTreeSet::new());
    }

    #[test]
    fn loop_rdom_sets() {
        let mut module = Module::new();
        let mut builder = FuncBuilder::new("f", &["n"], &mut module.syms);

        let entry = builder.block("entry");
        let header = builder.block("header");
        let body = builder.block("body");
        let exit = builder.block("exit");

        builder.select(entry);
        builder.br(header);

        builder.select(header);
        let cond = builder.cmp(CmpPred::Lt, builder.arg(0), FuncBuilder::int(10));
        builder.cond_br(cond, body, exit);

        builder.select(body);
        builder.br(header);

        builder.select(exit);
        builder.ret(None);

        let built = builder.build();

        module.add_function(built);
        rdom_tree_pass(&mut module).unwrap();

        assert_eq!(rdoms(&module, entry), BTreeSet::from([entry, header, exit]));
        assert_eq!(rdoms(&module, body), BTreeSet::from([body, header, exit]));
        assert_eq!(rdoms(&module, header), BTreeSet::from([header, exit]));

        // header branches two ways; its frontier lands on the loop
        let func = &module.funcs[0];
        assert!(func.get_block(body).get_rdom_frontier().contains(&header));
        assert!(func.get_block(header).get_rdom_frontier().contains(&header));
    }

    #[test]
    fn missing_exit_is_fatal() {
        let mut module = Module::new();
        let mut builder = FuncBuilder::new("spin", &[], &mut module.syms);

        let entry = builder.block("entry");
        builder.select(entry);
        builder.br(entry);

        let built = builder.build();

        module.add_function(built);

        assert_eq!(
            rdom_tree_pass(&mut module),
            Err(PassError::MissingExit { func: "spin".to_string() })
        );
    }

    #[test]
    fn multiple_exits_are_fatal() {
        let mut module = Module::new();
        let mut builder = FuncBuilder::new("twice", &["a"], &mut module.syms);

        let entry = builder.block("entry");
        let left = builder.block("left");
        let right = builder.block("right");

        builder.select(entry);
        let cond = builder.cmp(CmpPred::Eq, builder.arg(0), FuncBuilder::int(0));
        builder.cond_br(cond, left, right);

        builder.select(left);
        builder.ret(None);

        builder.select(right);
        builder.ret(None);

        let built = builder.build();

        module.add_function(built);

        assert_eq!(
            rdom_tree_pass(&mut module),
            Err(PassError::MultipleExits { func: "twice".to_string() })
        );
    }

    #[test]
    fn declarations_are_skipped() {
        let mut module = Module::new();
        let name = module.syms.get_id("external");
        module.add_function(Function::new(name, vec![]));

        assert!(rdom_tree_pass(&mut module).is_ok());
    }
}
