//! Operator confirmation before anything is installed.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::info;

use crate::core::UpdateError;

/// Source of the operator's answer.
pub trait Prompt {
    /// Shows `question` and returns one line of input, or `None` when no
    /// answer could be read.
    fn ask(&mut self, question: &str) -> Option<String>;
}

/// Prompts on stdout and reads a line from stdin.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str) -> Option<String> {
        print!("{question}");
        std::io::stdout().flush().ok()?;

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(answer),
        }
    }
}

/// Accepted affirmative answers, compared case-insensitively.
const AFFIRMATIVE: &[&str] = &["y", "yes", "sure"];

/// Asks the operator to approve moving from `current` to `target`.
///
/// Non-interactive requests proceed without asking.
///
/// # Errors
///
/// [`UpdateError::UserAborted`] for anything other than an affirmative
/// answer, including empty input and read failures.
pub fn confirm(
    prompt: &mut dyn Prompt,
    non_interactive: bool,
    display_name: &str,
    current: &str,
    target: &str,
) -> Result<()> {
    if non_interactive {
        info!(
            "Updating {} from {} to {}; --yes given, continuing without prompts.",
            display_name, current, target
        );
        return Ok(());
    }

    let question = format!("This will update {display_name} from {current} to {target}. Continue? [y/n] ");
    let answer = prompt.ask(&question).unwrap_or_default();
    let answer = answer.trim().to_lowercase();
    if AFFIRMATIVE.contains(&answer.as_str()) {
        Ok(())
    } else {
        Err(UpdateError::UserAborted.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::is_user_abort;
    use crate::test_utils::ScriptedPrompt;

    #[test]
    fn test_affirmative_answers() {
        for answer in ["y\n", "YES\n", "Sure", "  yes  \r\n"] {
            let mut prompt = ScriptedPrompt::answering(answer);
            confirm(&mut prompt, false, "Tailscale", "1.44.0", "1.46.2").unwrap();
            assert_eq!(
                prompt.questions,
                vec!["This will update Tailscale from 1.44.0 to 1.46.2. Continue? [y/n] ".to_string()]
            );
        }
    }

    #[test]
    fn test_anything_else_aborts() {
        for answer in [Some("n\n"), Some("\n"), Some("yep"), None] {
            let mut prompt = ScriptedPrompt::new(answer.map(str::to_string));
            let err = confirm(&mut prompt, false, "Tailscale", "1.44.0", "1.46.2").unwrap_err();
            assert!(is_user_abort(&err));
            assert_eq!(err.to_string(), "aborting update");
        }
    }

    #[test]
    fn test_non_interactive_skips_prompt() {
        let mut prompt = ScriptedPrompt::new(None);
        confirm(&mut prompt, true, "Tailscale", "1.44.0", "1.46.2").unwrap();
        assert!(prompt.questions.is_empty());
    }
}
