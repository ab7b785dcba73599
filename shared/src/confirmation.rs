use crate::types::Result;
use dialoguer::{theme::ColorfulTheme, Confirm};

/// Yes/no prompt. Returns `default_yes` when stdin is not a terminal.
pub fn ask_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let answer = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default_yes)
        .interact_opt()?;
    Ok(answer.unwrap_or(default_yes))
}
