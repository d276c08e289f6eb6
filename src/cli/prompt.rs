//! Interactive prompts shared by the commands

use anyhow::{Context, Result};
use std::io::{self, Write};

/// Prompt for a required value
pub fn prompt_required(prompt: &str) -> Result<String> {
    let prompt_text = format!("{}: ", prompt);

    loop {
        let input = prompt_input(&prompt_text)?;

        if input.trim().is_empty() {
            println!("❌ This field is required. Please enter a value.");
            continue;
        }

        return Ok(input.trim().to_string());
    }
}

/// Prompt for yes/no with default
pub fn prompt_yes_no(prompt: &str, default_yes: bool) -> Result<bool> {
    let default_indicator = if default_yes { "[Y/n]" } else { "[y/N]" };
    let prompt_text = format!("{} {}: ", prompt, default_indicator);

    loop {
        let input = prompt_input(&prompt_text)?.to_lowercase();

        match input.as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            "" => return Ok(default_yes),
            _ => {
                println!("Please enter 'y' for yes or 'n' for no.");
                continue;
            }
        }
    }
}

/// Low-level input prompting
fn prompt_input(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    if read == 0 {
        anyhow::bail!("Unexpected end of input");
    }

    Ok(input.trim_end().to_string())
}
