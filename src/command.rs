use crate::env::Environment;
use crate::io_adapters::LinePrompt;
use crate::rating::Prompt;
use crate::store::{FileStore, StateStore};
use crate::subscription::{Clock, SystemClock};
use std::io::{self, Write};

/// Everything a directive may touch besides the output sink.
///
/// The binary builds one with [`Runtime::from_env`]; tests assemble one from
/// a `MemoryStore`, a `FixedClock` and a `ScriptedPrompt`.
pub struct Runtime {
    pub env: Environment,
    pub store: Box<dyn StateStore>,
    pub clock: Box<dyn Clock>,
    pub prompt: Box<dyn Prompt>,
}

impl Runtime {
    pub fn new(
        env: Environment,
        store: Box<dyn StateStore>,
        clock: Box<dyn Clock>,
        prompt: Box<dyn Prompt>,
    ) -> Self {
        Self {
            env,
            store,
            clock,
            prompt,
        }
    }

    /// File-backed store, wall clock and terminal prompt.
    pub fn from_env(env: Environment) -> Self {
        let store = FileStore::new(env.clone());
        Self::new(
            env,
            Box::new(store),
            Box::new(SystemClock),
            Box::new(LinePrompt::new()),
        )
    }
}

/// How a directive is recognised from the text after the keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// The whole text must equal this.
    Exact(&'static str),
    /// The text must start with this.
    Prefix(&'static str),
}

impl Pattern {
    pub fn matches(self, text: &str) -> bool {
        match self {
            Pattern::Exact(p) => text == p,
            Pattern::Prefix(p) => text.starts_with(p),
        }
    }
}

/// Object-safe trait for a directive ready to run.
///
/// Implemented by built-in directives via a blanket impl.
pub trait ExecutableDirective {
    /// Run the directive. Failures are written to `out`; only a failing sink
    /// is returned as an error.
    fn execute(self: Box<Self>, runtime: &mut Runtime, out: &mut dyn Write) -> io::Result<()>;
}

/// Factory that tries to create a directive from the text after the keyword.
///
/// Returns `None` when the factory doesn't recognize the text.
pub trait DirectiveFactory {
    fn try_create(&self, text: &str) -> Option<Box<dyn ExecutableDirective>>;
}
