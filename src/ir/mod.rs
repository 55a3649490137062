mod block;
mod cfg_vizualizer;
mod func;
mod func_builder;
mod instruction;
mod module;
mod value;

pub mod analysis;
pub mod optimizer;

pub use block::{BasicBlock, BlockId};
pub use cfg_vizualizer::cfg_to_svg;
pub use func::{Arg, Function, ENTRY_BLOCK_ID};
pub use func_builder::FuncBuilder;
pub use instruction::{CmpPred, Instruction, Opcode, Ty};
pub use module::Module;
pub use value::{Constant, InstrId, Operand, ValueId};
