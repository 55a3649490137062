use graphviz_rust::{
    dot_structures::*,
    dot_generator::*,
    cmd::{CommandArg, Format},
    exec,
    printer::PrinterContext,
};

use crate::symbol_map::SymbolMap;
use super::func::Function;

pub fn cfg_to_svg(func: &Function, syms: &SymbolMap) {
    let name = format!("func_{}", syms.get_str(func.get_name()));
    let mut g = graph!(strict di id!(name));

    for block in func.get_blocks().iter() {
        let id = block.get_id();
        let label = syms.get_str(block.get_name());

        g.add_stmt(stmt!(node!(id; attr!("shape", "box"), attr!("label", label))));

        for successor in block.get_successors().iter() {
            g.add_stmt(stmt!(edge!(node_id!(id) => node_id!(successor))));
        }
    }

    let svg_name = format!("{}.svg", name);
    exec(g, &mut PrinterContext::default(), vec![
        CommandArg::Format(Format::Svg),
        CommandArg::Output(svg_name)
    ]).unwrap();
}
