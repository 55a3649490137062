use std::collections::HashMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymID(u32);

pub struct SymbolMap {
    map: HashMap<String, SymID>,
    syms: Vec<String>,
}

impl SymbolMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            syms: vec![],
        }
    }

    pub fn get_id(&mut self, str: &str) -> SymID {
        match self.map.get(str) {
            Some(id) => *id,
            None => {
                let id = SymID(self.syms.len().try_into().unwrap());

                self.map.insert(str.to_string(), id);
                self.syms.push(str.to_string());

                id
            }
        }
    }

    pub fn get_str(&self, id: SymID) -> &str {
        &self.syms[id.0 as usize]
    }
}

impl Default for SymbolMap {
    fn default() -> Self {
        Self::new()
    }
}
