//! Shell completion scripts.

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::args::Cli;
use crate::error::SyncError;

const BIN_NAME: &str = "metabolikal-sync";

/// Execute the completions command.
///
/// # Errors
///
/// Returns an error if the generated script is not valid UTF-8.
pub fn completions(shell: Shell, install: bool) -> Result<String, SyncError> {
    if install {
        return Ok(completion_install_instructions(shell));
    }
    generate_completions(shell)
}

/// Generate the completion script for `shell`.
///
/// # Errors
///
/// Returns an error if the generated script is not valid UTF-8.
pub fn generate_completions(shell: Shell) -> Result<String, SyncError> {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut buf);
    String::from_utf8(buf).map_err(|e| SyncError::Parse(format!("UTF-8 error: {e}")))
}

/// How to install the completion script for `shell`.
#[must_use]
pub fn completion_install_instructions(shell: Shell) -> String {
    match shell {
        Shell::Bash => format!(
            "# Add to ~/.bashrc:\nsource <({BIN_NAME} completions bash)\n"
        ),
        Shell::Zsh => format!(
            "# Save to your fpath:\n{BIN_NAME} completions zsh > ~/.zsh/completions/_{BIN_NAME}\n\
             # Then in ~/.zshrc, before compinit:\nfpath=(~/.zsh/completions $fpath)\n"
        ),
        Shell::Fish => format!(
            "# Save to the fish completions directory:\n\
             {BIN_NAME} completions fish > ~/.config/fish/completions/{BIN_NAME}.fish\n"
        ),
        Shell::PowerShell => format!(
            "# Add to your PowerShell profile ($PROFILE):\n\
             {BIN_NAME} completions powershell | Out-String | Invoke-Expression\n"
        ),
        Shell::Elvish => format!(
            "# Save to the elvish lib directory:\n\
             {BIN_NAME} completions elvish > ~/.elvish/lib/{BIN_NAME}.elv\n"
        ),
        _ => "Unknown shell".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_bash_completions() {
        let script = generate_completions(Shell::Bash).unwrap();
        assert!(script.contains(BIN_NAME));
        assert!(script.contains("complete"));
    }

    #[test]
    fn test_generate_fish_completions() {
        let script = generate_completions(Shell::Fish).unwrap();
        assert!(script.contains("plan-day"));
    }

    #[test]
    fn test_install_flag_returns_instructions() {
        let text = completions(Shell::Zsh, true).unwrap();
        assert!(text.contains("fpath"));
    }
}
