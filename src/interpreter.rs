use crate::builtin::default_directives;
use crate::classifier::{self, Line};
use crate::command::{DirectiveFactory, Runtime};
use crate::env::Environment;
use crate::error::RunError;
use crate::frame::CallFrame;
use crate::functions::FunctionTable;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Factory allows creating instances of ExecutableDirective.
///
/// Only supports directives defined in this crate, see `BuiltinDirective`.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Where the script reader is: at top level or collecting a function body.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ParserState {
    TopLevel,
    InFunction(String),
}

/// Runs `.msx` scripts.
///
/// The interpreter owns the [`Runtime`] that directives act on and the
/// ordered list of [`DirectiveFactory`] objects queried for each directive
/// line. Function tables are per run: nothing declared by one script is
/// visible to the next.
///
/// Example
/// ```
/// use msx::{Interpreter, Runtime, Environment, MemoryStore, FixedClock, ScriptedPrompt};
///
/// let runtime = Runtime::new(
///     Environment::isolated("."),
///     Box::new(MemoryStore::new()),
///     Box::new(FixedClock::at(0)),
///     Box::new(ScriptedPrompt::default()),
/// );
/// let mut msx = Interpreter::new(runtime);
/// let mut out = Vec::new();
/// msx.run("function hi(who) {\n print \"hi $who\"\n}\ncall hi(\"there\")", &mut out).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "hi there\n");
/// ```
pub struct Interpreter {
    runtime: Runtime,
    directives: Vec<Box<dyn DirectiveFactory>>,
}

impl Interpreter {
    /// Create an interpreter with the built-in directive table.
    pub fn new(runtime: Runtime) -> Self {
        Self::with_directives(runtime, default_directives())
    }

    /// Create an interpreter with a custom, ordered set of directive factories.
    pub fn with_directives(runtime: Runtime, directives: Vec<Box<dyn DirectiveFactory>>) -> Self {
        Self {
            runtime,
            directives,
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Read `path` and run it.
    pub fn run_file(&mut self, path: &Path, out: &mut dyn Write) -> Result<(), RunError> {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RunError::SourceNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(RunError::SourceUnreadable {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        info!(path = %path.display(), "running script");
        self.run(&source, out)
    }

    /// Run a whole script.
    ///
    /// The script is checked for unterminated function bodies first, so a
    /// malformed script produces no output at all. After that, lines run in
    /// order; an undefined function aborts the rest of the run.
    pub fn run(&mut self, source: &str, out: &mut dyn Write) -> Result<(), RunError> {
        let lines: Vec<(&str, Line)> = source
            .lines()
            .map(|raw| (raw, classifier::classify(raw)))
            .collect();

        check_structure(&lines)?;

        let mut functions = FunctionTable::new();
        let mut state = ParserState::TopLevel;

        for (idx, (raw, line)) in lines.into_iter().enumerate() {
            let line_no = idx + 1;
            debug!(line_no, ?line, "classified");

            match (&state, line) {
                (_, Line::Empty) => {}
                (ParserState::InFunction(_), Line::FunctionClose) => {
                    state = ParserState::TopLevel;
                }
                (ParserState::InFunction(name), _) => {
                    functions.push_body_line(name, raw);
                }
                (ParserState::TopLevel, Line::FunctionOpen { name, params }) => {
                    debug!(function = %name, ?params, "defining function");
                    functions.define(name.clone(), params, Vec::new());
                    state = ParserState::InFunction(name);
                }
                (ParserState::TopLevel, Line::Call { name, args }) => {
                    self.execute_call(&functions, &name, &args, line_no, out)?;
                }
                (ParserState::TopLevel, Line::Print { text }) => {
                    writeln!(out, "{}", text)?;
                }
                (ParserState::TopLevel, Line::Directive { text }) => {
                    self.dispatch_directive(&text, out)?;
                }
                (ParserState::TopLevel, Line::FunctionClose) => {
                    warn!(line_no, "closing brace outside a function");
                    writeln!(
                        out,
                        "Unknown command at line {}: {}",
                        line_no,
                        classifier::BODY_CLOSE
                    )?;
                }
                (ParserState::TopLevel, Line::Unknown { text }) => {
                    warn!(line_no, text = %text, "unrecognized statement");
                    writeln!(out, "Unknown command at line {}: {}", line_no, text)?;
                }
            }
        }

        Ok(())
    }

    /// Execute `name` with literal arguments against the current table.
    fn execute_call(
        &self,
        functions: &FunctionTable,
        name: &str,
        args: &[String],
        line_no: usize,
        out: &mut dyn Write,
    ) -> Result<(), RunError> {
        let Some(def) = functions.lookup(name) else {
            error!(function = name, line_no, "call to undefined function");
            return Err(RunError::UndefinedFunction {
                name: name.to_string(),
                line: line_no,
            });
        };

        let frame = CallFrame::bind(def, args);
        debug!(
            function = %frame.function_name,
            bound = frame.bindings().len(),
            "calling"
        );

        for body_line in &def.body {
            match classifier::classify(body_line) {
                Line::Print { text } => {
                    writeln!(out, "{}", frame.substitute(&text))?;
                }
                Line::Call { name: nested, .. } => {
                    debug!(caller = name, callee = %nested, "skipping nested call");
                    writeln!(
                        out,
                        "Nested call detected but not executed: {}",
                        body_line.trim()
                    )?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Match the text after the directive keyword against the directive table.
    fn dispatch_directive(&mut self, text: &str, out: &mut dyn Write) -> Result<(), RunError> {
        for factory in &self.directives {
            if let Some(directive) = factory.try_create(text) {
                debug!(directive = text, "dispatching");
                directive.execute(&mut self.runtime, out)?;
                return Ok(());
            }
        }
        warn!(directive = text, "unknown directive");
        writeln!(
            out,
            "Unknown MSX statement: {}{}",
            classifier::DIRECTIVE_KEYWORD,
            text
        )?;
        Ok(())
    }

    /// Interactive loop: every entered line runs as a one-line script.
    ///
    /// `exit` or end of input leaves the loop.
    pub fn repl(&mut self, out: &mut dyn Write) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;

        while !self.runtime.env.should_exit {
            match rl.readline("msx> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    if line.trim() == "exit" {
                        self.runtime.env.should_exit = true;
                        continue;
                    }
                    if let Err(e) = self.run(&line, out) {
                        writeln!(out, "Error: {}", e)?;
                    }
                    out.flush()?;
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    /// Interpreter over the process environment: file-backed state in the
    /// current directory, wall clock and terminal prompt.
    fn default() -> Self {
        Self::new(Runtime::from_env(Environment::new()))
    }
}

/// Walk the classified lines through the open/close state machine and fail
/// if a body is still open at end of script.
fn check_structure(lines: &[(&str, Line)]) -> Result<(), RunError> {
    let mut open: Option<(&str, usize)> = None;
    for (idx, (_, line)) in lines.iter().enumerate() {
        match (open, line) {
            (None, Line::FunctionOpen { name, .. }) => open = Some((name.as_str(), idx + 1)),
            (Some(_), Line::FunctionClose) => open = None,
            _ => {}
        }
    }
    match open {
        Some((name, line)) => Err(RunError::UnterminatedFunction {
            name: name.to_string(),
            line,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::ScriptedPrompt;
    use crate::store::{MemoryStore, Resource};
    use crate::subscription::FixedClock;

    fn interpreter(store: MemoryStore) -> Interpreter {
        Interpreter::new(Runtime::new(
            Environment::isolated("."),
            Box::new(store),
            Box::new(FixedClock::at(1_700_000_000)),
            Box::new(ScriptedPrompt::default()),
        ))
    }

    fn run(source: &str) -> (Result<(), RunError>, String) {
        let mut msx = interpreter(MemoryStore::new());
        let mut out = Vec::new();
        let res = msx.run(source, &mut out);
        (res, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_top_level_print_is_verbatim() {
        let (res, out) = run("print \"Hello $name!\"\n# comment\n\nprint \"bye\"");
        assert!(res.is_ok());
        assert_eq!(out, "Hello $name!\nbye\n");
    }

    #[test]
    fn test_call_substitutes_params() {
        let source = "\
function greet(first, last) {
    print \"Hello, $first $last!\"
    print \"plain\"
}
call greet(\"Ada\", \"Lovelace\")
";
        let (res, out) = run(source);
        assert!(res.is_ok());
        assert_eq!(out, "Hello, Ada Lovelace!\nplain\n");
    }

    #[test]
    fn test_undefined_function_aborts_with_line_number() {
        let (res, out) = run("print \"before\"\n\ncall nope()\nprint \"after\"");
        match res {
            Err(RunError::UndefinedFunction { name, line }) => {
                assert_eq!(name, "nope");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(out, "before\n");
    }

    #[test]
    fn test_unterminated_function_runs_nothing() {
        let (res, out) = run("print \"first\"\nfunction f() {\n print \"x\"\n");
        match res {
            Err(e @ RunError::UnterminatedFunction { .. }) => {
                assert!(e.is_parse_error());
                assert_eq!(e.to_string(), "Unterminated function body 'f' opened at line 2");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_unknown_lines_are_reported_and_skipped() {
        let (res, out) = run("bogus line\nprint \"ok\"\n}\nmsx fly away");
        assert!(res.is_ok());
        assert_eq!(
            out,
            "Unknown command at line 1: bogus line\nok\nUnknown command at line 3: }\nUnknown MSX statement: msx fly away\n"
        );
    }

    #[test]
    fn test_redefinition_uses_latest_body() {
        let source = "\
function f() {
  print \"old\"
}
call f()
function f() {
  print \"new\"
}
call f()
";
        let (res, out) = run(source);
        assert!(res.is_ok());
        assert_eq!(out, "old\nnew\n");
    }

    #[test]
    fn test_body_lines_are_stored_raw() {
        // A directive inside a body is neither run nor reported.
        let source = "\
function f() {
  msx restart
  not a statement
  print \"done\"
}
call f()
";
        let (res, out) = run(source);
        assert!(res.is_ok());
        assert_eq!(out, "done\n");
    }

    #[test]
    fn test_nested_call_is_skipped() {
        let source = "\
function inner() {
  print \"inner ran\"
}
function outer() {
  call inner()
}
call outer()
";
        let (res, out) = run(source);
        assert!(res.is_ok());
        assert_eq!(out, "Nested call detected but not executed: call inner()\n");
    }

    #[test]
    fn test_call_before_definition_is_undefined() {
        let (res, _) = run("call later()\nfunction later() {\n}\n");
        assert!(matches!(res, Err(RunError::UndefinedFunction { line: 1, .. })));
    }

    #[test]
    fn test_directive_reaches_store() {
        let (store, handle) = MemoryStore::with_handle();
        let mut msx = interpreter(store);
        let mut out = Vec::new();

        msx.run("msx subscribe 100\nmsx subscription check", &mut out)
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Subscription activated for 72 hours!\nSubscription active. 72.00 hours remaining.\n"
        );
        assert!(handle.contains(Resource::Subscription));
    }

    #[test]
    fn test_custom_directive_table() {
        let mut msx = Interpreter::with_directives(
            Runtime::new(
                Environment::isolated("."),
                Box::new(MemoryStore::new()),
                Box::new(FixedClock::at(0)),
                Box::new(ScriptedPrompt::default()),
            ),
            Vec::new(),
        );
        let mut out = Vec::new();
        msx.run("msx help", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Unknown MSX statement: msx help\n");
    }

    #[test]
    fn test_missing_file_is_source_not_found() {
        let mut msx = interpreter(MemoryStore::new());
        let res = msx.run_file(Path::new("/definitely/not/here.msx"), &mut Vec::new());
        assert!(matches!(res, Err(RunError::SourceNotFound { .. })));
    }
}
