// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Interactive prompting.
//!
//! Thin seam over inquire so that operation preparation steps can be
//! exercised in tests with scripted answers instead of a live terminal.

use inquire::Text;

/// Obtain values from the user interactively.
pub trait Prompt {
    /// Obtain a line of text from the user, suspending until answered.
    ///
    /// The initial value, when given, is accepted as-is when the user just
    /// hits enter.
    fn text(&self, message: &str, initial: Option<&str>) -> Result<String>;
}

/// Prompt on the controlling terminal through inquire.
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl Prompt for InquirePrompter {
    fn text(&self, message: &str, initial: Option<&str>) -> Result<String> {
        let mut text = Text::new(message);
        if let Some(initial) = initial {
            text = text.with_default(initial);
        }

        Ok(text.prompt()?)
    }
}

/// Interactive prompting fails, or gets cancelled by the user.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct PromptError(#[from] inquire::InquireError);

/// Friendly result alias :3
pub type Result<T, E = PromptError> = std::result::Result<T, E>;
