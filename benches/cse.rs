use criterion::*;
use optir::ir::optimizer::eliminate_common_subexprs;
use optir::ir::{FuncBuilder, Opcode};
use optir::Module;

// A ladder of blocks, each recomputing the same handful of expressions.
// Every block past the first gets fully cleaned out, so this exercises
// the availability fixpoint and the reaching-definition walk together.
fn ladder_module(blocks: usize) -> Module {
    let mut module = Module::new();
    let mut builder = FuncBuilder::new("ladder", &["a", "b"], &mut module.syms);

    let ids: Vec<_> = (0..blocks).map(|i| builder.block(&format!("b{}", i))).collect();

    for (i, &id) in ids.iter().enumerate() {
        builder.select(id);

        let sum = builder.binary(Opcode::Add, builder.arg(0), builder.arg(1));
        let prod = builder.binary(Opcode::Mul, builder.arg(0), builder.arg(1));
        let mixed = builder.binary(Opcode::Mul, sum, prod);

        if i + 1 < blocks {
            builder.br(ids[i + 1]);
        } else {
            builder.ret(Some(mixed));
        }
    }

    module.add_function(builder.build());

    module
}

fn cse_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("Global CSE");

    for blocks in [16usize, 64, 256].into_iter() {
        group.throughput(Throughput::Elements(blocks as u64));
        group.bench_with_input(format!("{} blocks", blocks), &blocks, move |b, &blocks| {
            b.iter(|| {
                let mut module = ladder_module(blocks);

                eliminate_common_subexprs(&mut module).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, cse_throughput);
criterion_main!(benches);
