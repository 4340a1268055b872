use std::collections::HashMap;

/// A user-defined function: its declared parameters and its unparsed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    /// Raw body lines, classified only when the function is called.
    pub body: Vec<String>,
}

/// Functions declared by one script run.
///
/// Declaring a name twice replaces the earlier definition. Nothing is ever
/// removed while the run lasts.
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `name`, overwriting any previous definition.
    pub fn define(&mut self, name: impl Into<String>, params: Vec<String>, body: Vec<String>) {
        let name = name.into();
        self.functions.insert(
            name.clone(),
            FunctionDef { name, params, body },
        );
    }

    /// Append one raw line to the body of an already defined function.
    pub fn push_body_line(&mut self, name: &str, line: impl Into<String>) {
        if let Some(def) = self.functions.get_mut(name) {
            def.body.push(line.into());
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }
}
