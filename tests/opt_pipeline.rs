use optir::ir::analysis::{live_var_pass, rdom_tree_pass};
use optir::ir::optimizer::eliminate_common_subexprs;
use optir::ir::{CmpPred, FuncBuilder, Opcode, Operand, ValueId};
use optir::Module;
use pretty_assertions::assert_eq;

// Entry computes a condition, both branches recompute the entry's sum,
// and the join recomputes it again. CSE must leave a single definition,
// and the later passes must agree with the rewritten graph.
fn build_diamond(module: &mut Module) {
    let mut builder = FuncBuilder::new("f", &["a", "b"], &mut module.syms);

    let entry = builder.block("entry");
    let left = builder.block("left");
    let right = builder.block("right");
    let join = builder.block("join");

    builder.select(entry);
    let cond = builder.cmp(CmpPred::Lt, builder.arg(0), builder.arg(1));
    let sum = builder.binary(Opcode::Add, builder.arg(0), builder.arg(1));
    builder.set_name(sum, "sum");
    builder.cond_br(cond, left, right);

    builder.select(left);
    let left_sum = builder.binary(Opcode::Add, builder.arg(0), builder.arg(1));
    builder.set_name(left_sum, "left_sum");
    builder.br(join);

    builder.select(right);
    let right_sum = builder.binary(Opcode::Add, builder.arg(1), builder.arg(0));
    builder.set_name(right_sum, "right_sum");
    builder.br(join);

    builder.select(join);
    let join_sum = builder.binary(Opcode::Add, builder.arg(0), builder.arg(1));
    builder.ret(Some(join_sum));

    let built = builder.build();

    module.add_function(built);
}

#[test]
fn cse_then_liveness_then_rdoms() {
    let mut module = Module::new();
    build_diamond(&mut module);

    eliminate_common_subexprs(&mut module).unwrap();

    // every redundant sum folds into the entry's definition
    let func = &module.funcs[0];
    let mut survivors = vec![];

    for block in func.get_blocks() {
        for &id in block.get_instrs() {
            let instr = func.get_instr(id);

            if instr.get_op() == Opcode::Add {
                survivors.push(id);
            }
        }
    }

    assert_eq!(survivors.len(), 1);
    let sum = survivors[0];

    // def-before-use still holds: every operand of a live instruction
    // refers to a live definition
    for block in func.get_blocks() {
        for &id in block.get_instrs() {
            for operand in func.get_instr(id).get_operands() {
                if let Some(ValueId::Instr(def)) = operand.value_id() {
                    assert!(!func.get_instr(def).is_removed());
                }
            }
        }
    }

    // commutative variants all collapsed onto the named entry sum
    let ret_block = func.get_blocks().last().unwrap();
    let ret = *ret_block.get_instrs().last().unwrap();
    assert_eq!(
        func.get_instr(ret).get_operands(),
        &vec![Operand::Value(ValueId::Instr(sum))]
    );

    let report = live_var_pass(&mut module);
    assert_eq!(
        report,
        "entry\nin:\na b \nout:\nsum \n\
         left\nin:\nsum \nout:\nsum \n\
         right\nin:\nsum \nout:\nsum \n\
         join\nin:\nsum \nout:\n\n"
    );

    rdom_tree_pass(&mut module).unwrap();

    let func = &module.funcs[0];
    let (entry, left, right, join) = (0, 1, 2, 3);

    assert!(func.get_block(join).get_rdoms().len() == 1);
    assert!(func.get_block(entry).get_rdoms().contains(&join));
    assert!(func.get_block(left).get_rdom_frontier().contains(&entry));
    assert!(func.get_block(right).get_rdom_frontier().contains(&entry));
}

#[test]
fn passes_skip_declarations_and_later_functions_still_run() {
    let mut module = Module::new();

    // external declaration first
    let name = module.syms.get_id("external");
    module.add_function(optir::ir::Function::new(name, vec![]));

    build_diamond(&mut module);

    eliminate_common_subexprs(&mut module).unwrap();
    rdom_tree_pass(&mut module).unwrap();

    let report = live_var_pass(&mut module);

    // the declaration contributes nothing to the report
    assert!(report.starts_with("entry\n"));
}
