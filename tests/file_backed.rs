use msx::{Environment, FileStore, FixedClock, Interpreter, RunError, Runtime, ScriptedPrompt};
use std::fs;
use std::path::Path;

fn interpreter(dir: &Path, answers: &[&str]) -> Interpreter {
    let env = Environment::isolated(dir);
    Interpreter::new(Runtime::new(
        env.clone(),
        Box::new(FileStore::new(env)),
        Box::new(FixedClock::at(1_700_000_000)),
        Box::new(ScriptedPrompt::new(answers.iter().copied())),
    ))
}

#[test]
fn state_files_follow_the_record_formats() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut msx = interpreter(dir.path(), &["2", "4"]);

    msx.run("msx subscribe 48\nmsx rate\nmsx rate\n", &mut Vec::new())?;

    assert_eq!(
        fs::read_to_string(dir.path().join("subs.msx"))?,
        "duration_hours=48\nstart_timestamp=1700000000\n"
    );
    assert_eq!(fs::read_to_string(dir.path().join("ratings.msx"))?, "2\n4\n");

    msx.run("msx restart\n", &mut Vec::new())?;
    assert!(!dir.path().join("subs.msx").exists());
    assert!(!dir.path().join("ratings.msx").exists());
    Ok(())
}

#[test]
fn ghost_table_is_read_from_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(
        dir.path().join("ghost.command-fig.json"),
        r#"{ "double_click": { "b_first": "one.msx", "a_second": "two.msx" } }"#,
    )?;
    let mut msx = interpreter(dir.path(), &[]);
    let mut out = Vec::new();

    msx.run("msx double click file commands\n", &mut out)?;

    assert_eq!(
        String::from_utf8(out)?,
        "Executing ghost command 'b_first' -> one.msx\nExecuting ghost command 'a_second' -> two.msx\n"
    );
    Ok(())
}

#[test]
fn run_file_reads_scripts_and_reports_missing_ones() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("hello.msx");
    fs::write(&script, "function hi(name) {\n  print \"hello $name\"\n}\ncall hi(\"world\")\n")?;
    let mut msx = interpreter(dir.path(), &[]);
    let mut out = Vec::new();

    msx.run_file(&script, &mut out)?;
    assert_eq!(String::from_utf8(out)?, "hello world\n");

    let missing = dir.path().join("missing.msx");
    match msx.run_file(&missing, &mut Vec::new()) {
        Err(e @ RunError::SourceNotFound { .. }) => {
            assert_eq!(e.to_string(), format!("File {} not found", missing.display()));
        }
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[test]
fn scaffold_lands_in_the_working_directory() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut msx = interpreter(dir.path(), &[]);

    msx.run("msx create custom subscriptions manager\n", &mut Vec::new())?;

    let written = fs::read_to_string(dir.path().join("subscription_manager.msx"))?;
    assert!(written.contains("function manage_subscriptions(user) {"));
    Ok(())
}
