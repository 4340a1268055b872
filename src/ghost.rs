//! Ghost commands: actions attached to an external trigger category.
//!
//! The table is a JSON object of objects, e.g.
//!
//! ```json
//! { "double_click": { "open": "open.msx", "reset": "restart.msx" } }
//! ```
//!
//! Actions are reported in file order. An action whose value is
//! [`RESET_TRIGGER`] also resets the extension state.

use crate::store::{Resource, StateStore};
use crate::subscription;
use anyhow::Result;
use serde_json::{Map, Value};
use std::io::Write;
use tracing::{debug, warn};

/// Action value that triggers a reset.
pub const RESET_TRIGGER: &str = "restart.msx";

/// Category fired by the `double click file commands` directive.
pub const DOUBLE_CLICK: &str = "double_click";

/// Category name to ordered `action key -> action value` mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GhostCommandTable {
    categories: Map<String, Value>,
}

impl GhostCommandTable {
    pub fn parse(text: &str) -> Result<Self> {
        let categories: Map<String, Value> = serde_json::from_str(text)?;
        Ok(Self { categories })
    }

    /// Actions of `category` in insertion order. Unknown categories and
    /// categories that are not objects have none.
    pub fn actions(&self, category: &str) -> Vec<(String, String)> {
        match self.categories.get(category) {
            Some(Value::Object(actions)) => actions
                .iter()
                .map(|(key, value)| (key.clone(), action_text(value)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn action_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Run every action registered for `category`.
///
/// Returns how many actions were reported. A missing table is reported and
/// counts as zero; so does a table that fails to parse.
pub fn dispatch(store: &mut dyn StateStore, category: &str, out: &mut dyn Write) -> Result<usize> {
    let Some(text) = store.load(Resource::GhostCommands)? else {
        writeln!(out, "No ghost commands file found.")?;
        return Ok(0);
    };

    let table = match GhostCommandTable::parse(&text) {
        Ok(table) => table,
        Err(e) => {
            warn!(error = %e, "malformed ghost commands file");
            writeln!(
                out,
                "Ghost commands file {} is malformed: {}",
                store.describe(Resource::GhostCommands),
                e
            )?;
            return Ok(0);
        }
    };

    let actions = table.actions(category);
    debug!(category, count = actions.len(), "dispatching ghost commands");
    for (key, action) in &actions {
        writeln!(out, "Executing ghost command '{}' -> {}", key, action)?;
        if action == RESET_TRIGGER {
            subscription::reset(store, out)?;
        }
    }
    Ok(actions.len())
}
