mod cse;

pub use cse::eliminate_common_subexprs;
