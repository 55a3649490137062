use crate::symbol_map::SymbolMap;
use super::func::Function;

pub struct Module {
    pub funcs: Vec<Function>,
    pub syms: SymbolMap,
}

impl Module {
    pub fn new() -> Self {
        Self {
            funcs: vec![],
            syms: SymbolMap::new(),
        }
    }

    pub fn add_function(&mut self, func: Function) {
        self.funcs.push(func);
    }

    pub fn get_functions(&self) -> &Vec<Function> {
        &self.funcs
    }

    pub fn get_functions_mut(&mut self) -> &mut Vec<Function> {
        &mut self.funcs
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}
