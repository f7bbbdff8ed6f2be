//! Collection of pull request metadata during submission.

use crate::errors::StResult;
use nu_ansi_term::Color;

/// Metadata about pull request creation.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct PrMetadata {
    /// Title of the pull request.
    pub title: String,
    /// Body of the pull request.
    pub body: String,
}

/// A source of pull request titles and bodies.
pub trait PrMetadataPrompt {
    /// Returns the title and body for a new pull request from `branch_name` into `parent_name`.
    ///
    /// An interrupted prompt surfaces as [StError::UserCancelled].
    ///
    /// [StError::UserCancelled]: crate::errors::StError::UserCancelled
    fn pr_metadata(&self, branch_name: &str, parent_name: &str) -> StResult<PrMetadata>;
}

/// Prompts the user on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractivePrompt;

impl PrMetadataPrompt for InteractivePrompt {
    fn pr_metadata(&self, branch_name: &str, parent_name: &str) -> StResult<PrMetadata> {
        let title = inquire::Text::new(
            format!(
                "Title of pull request (`{}` -> `{}`):",
                Color::Green.paint(branch_name),
                Color::Yellow.paint(parent_name)
            )
            .as_str(),
        )
        .with_default(branch_name)
        .prompt()?;
        let body = inquire::Editor::new("Pull request description").prompt()?;

        Ok(PrMetadata { title, body })
    }
}

/// Answers every prompt with fixed values. Used for non-interactive runs and tests.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ScriptedPrompt {
    /// Title to use. When empty, the branch name is used.
    pub title: String,
    /// Body to use.
    pub body: String,
}

impl PrMetadataPrompt for ScriptedPrompt {
    fn pr_metadata(&self, branch_name: &str, _: &str) -> StResult<PrMetadata> {
        let title = if self.title.is_empty() {
            branch_name.to_string()
        } else {
            self.title.clone()
        };
        Ok(PrMetadata {
            title,
            body: self.body.clone(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::{PrMetadataPrompt, ScriptedPrompt};

    #[test]
    fn scripted_prompt_falls_back_to_branch_name() {
        let meta = ScriptedPrompt::default().pr_metadata("feature", "main").unwrap();
        assert_eq!(meta.title, "feature");
        assert!(meta.body.is_empty());

        let prompt = ScriptedPrompt {
            title: "Add thing".to_string(),
            body: "Body".to_string(),
        };
        let meta = prompt.pr_metadata("feature", "main").unwrap();
        assert_eq!(meta.title, "Add thing");
        assert_eq!(meta.body, "Body");
    }
}
