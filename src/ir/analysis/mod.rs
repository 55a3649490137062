mod dfa;
mod expr;
mod liveness;
mod rdom_tree;

pub use dfa::Dfa;
pub use expr::{is_valid_expr, ExprKey, OperandKey};
pub use liveness::{live_var_pass, LiveVarAnalysis};
pub use rdom_tree::rdom_tree_pass;
