//! A small runtime for `.msx` extension scripts.
//!
//! Scripts are line oriented: flat function declarations, single-level calls
//! with `$param` substitution in print strings, literal prints, and `msx`
//! directives that manage a subscription/rating lifecycle and fire ghost
//! commands loaded from a JSON table.
//!
//! The main entry point is [`Interpreter`], which runs a script against a
//! [`Runtime`]. Persisted state goes through the [`StateStore`] trait so the
//! core never touches the filesystem directly; [`MemoryStore`],
//! [`FixedClock`] and [`ScriptedPrompt`] stand in for the real collaborators
//! in tests.

pub mod batch;
mod builtin;
pub mod classifier;
pub mod command;
pub mod env;
mod error;
pub mod frame;
pub mod functions;
pub mod ghost;
mod interpreter;
pub mod io_adapters;
pub mod rating;
pub mod scan;
pub mod store;
pub mod subscription;

pub use command::Runtime;
pub use env::Environment;
pub use error::RunError;
pub use interpreter::Interpreter;
pub use io_adapters::{LinePrompt, ScriptedPrompt};
pub use store::{FileStore, MemoryStore, Resource, StateStore};
pub use subscription::{Clock, FixedClock, SystemClock};
