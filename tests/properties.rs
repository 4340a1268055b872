use msx::classifier::{Line, classify};
use msx::{Environment, FixedClock, Interpreter, MemoryStore, Runtime, ScriptedPrompt};
use proptest::prelude::*;

fn interpreter() -> Interpreter {
    Interpreter::new(Runtime::new(
        Environment::isolated("."),
        Box::new(MemoryStore::new()),
        Box::new(FixedClock::at(0)),
        Box::new(ScriptedPrompt::default()),
    ))
}

proptest! {
    /// The classifier never panics and never drops a non-blank line.
    #[test]
    fn classifier_does_not_panic(s in "\\PC*") {
        let line = classify(&s);
        if !s.trim().is_empty() && !s.trim().starts_with('#') {
            prop_assert_ne!(line, Line::Empty);
        }
    }

    /// A top-level print emits its text untouched, markers included.
    #[test]
    fn top_level_print_is_verbatim(text in "[a-zA-Z0-9 $,.!?]*") {
        let mut msx = interpreter();
        let mut out = Vec::new();
        msx.run(&format!("print \"{}\"", text), &mut out).unwrap();
        prop_assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", text));
    }

    /// Bound values land in the output exactly where their markers were.
    #[test]
    fn call_substitutes_both_params(a in "[a-z0-9]{1,12}", b in "[a-z0-9]{1,12}") {
        let mut msx = interpreter();
        let mut out = Vec::new();
        let source = format!(
            "function f(x, xy) {{\n print \"<$xy|$x>\"\n}}\ncall f(\"{}\", \"{}\")\n",
            a, b
        );
        msx.run(&source, &mut out).unwrap();
        prop_assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("<{}|{}>\n", b, a)
        );
    }
}
