use crate::rating::Prompt;
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;

/// Terminal prompt backed by `rustyline`.
///
/// The editor is created on first use so that scripts which never prompt
/// don't touch the terminal at all.
#[derive(Default)]
pub struct LinePrompt {
    editor: Option<DefaultEditor>,
}

impl LinePrompt {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompt for LinePrompt {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let editor = match self.editor.take() {
            Some(editor) => editor,
            None => DefaultEditor::new()?,
        };
        let editor = self.editor.insert(editor);
        match editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Memory-backed prompt that replays canned answers, then reports end of
/// input.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.answers.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_prompt_replays_then_ends() {
        let mut prompt = ScriptedPrompt::new(["4", "oops"]);
        assert_eq!(prompt.read_line("? ").unwrap(), Some("4".to_string()));
        assert_eq!(prompt.read_line("? ").unwrap(), Some("oops".to_string()));
        assert_eq!(prompt.read_line("? ").unwrap(), None);
    }
}
