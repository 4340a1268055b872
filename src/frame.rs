use crate::functions::FunctionDef;

/// Character that starts a parameter reference inside a print string.
pub const PARAM_MARKER: char = '$';

/// Arguments bound for one function call.
///
/// Arguments bind to parameters by position; extra arguments and unmatched
/// parameters are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    pub function_name: String,
    bindings: Vec<(String, String)>,
}

impl CallFrame {
    pub fn bind(def: &FunctionDef, args: &[String]) -> Self {
        let bindings = def
            .params
            .iter()
            .zip(args)
            .map(|(param, arg)| (param.clone(), arg.clone()))
            .collect();
        Self {
            function_name: def.name.clone(),
            bindings,
        }
    }

    pub fn bindings(&self) -> &[(String, String)] {
        &self.bindings
    }

    /// Replace every `$name` reference to a bound parameter with its value.
    ///
    /// Single left-to-right pass: at each marker the longest bound name that
    /// follows it wins, and substituted values are never scanned again. A
    /// marker not followed by a bound name is kept as-is.
    pub fn substitute(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(pos) = rest.find(PARAM_MARKER) {
            result.push_str(&rest[..pos]);
            let after = &rest[pos + PARAM_MARKER.len_utf8()..];

            let longest = self
                .bindings
                .iter()
                .filter(|(name, _)| after.starts_with(name.as_str()))
                .max_by_key(|(name, _)| name.len());

            match longest {
                Some((name, value)) => {
                    result.push_str(value);
                    rest = &after[name.len()..];
                }
                None => {
                    result.push(PARAM_MARKER);
                    rest = after;
                }
            }
        }

        result.push_str(rest);
        result
    }
}
