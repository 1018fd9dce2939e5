use std::path::PathBuf;

use anyhow::{Result, bail};

use super::{DEFAULT_TOKEN_ENV, folder_or_cwd, name_from_folder, token_from_env};
use crate::core::prefs::Prefs;
use crate::core::style;
use crate::core::validate;
use crate::providers::RemoteHost;
use crate::providers::github::GithubHost;

pub async fn run(
    folder: Option<PathBuf>,
    name: Option<String>,
    token_env: Option<String>,
    live: bool,
) -> Result<()> {
    let prefs = Prefs::load();

    let folder = folder_or_cwd(folder)?;
    let name = match name {
        Some(name) => name,
        None => name_from_folder(&folder)?,
    };
    let token_env = token_env
        .or_else(|| prefs.token_env.clone())
        .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string());

    let mut failures = 0;

    eprintln!("{}", style::section("Local checks"));

    match validate::check_folder(&folder) {
        Ok(()) => eprintln!(
            "{}",
            style::success(&format!("Folder looks ready: {}", folder.display()))
        ),
        Err(err) => {
            failures += 1;
            eprintln!("{}", style::error(&err.to_string()));
        }
    }

    match validate::check_repo_name(&name) {
        Ok(()) => eprintln!(
            "{}",
            style::success(&format!("Repository name is valid: {name}"))
        ),
        Err(err) => {
            failures += 1;
            eprintln!("{}", style::error(&err.to_string()));
        }
    }

    // The token value itself is never printed, only the verdict
    let token = match token_from_env(&token_env) {
        Ok(token) => match validate::check_token(&token) {
            Ok(()) => {
                eprintln!(
                    "{}",
                    style::success(&format!("Token from ${token_env} looks well-formed"))
                );
                Some(token)
            }
            Err(err) => {
                failures += 1;
                eprintln!("{}", style::error(&err.to_string()));
                None
            }
        },
        Err(err) => {
            failures += 1;
            eprintln!("{}", style::error(&format!("{err:#}")));
            None
        }
    };

    if live {
        eprintln!();
        eprintln!("{}", style::section("Live checks"));
        match token {
            Some(token) => {
                let host = GithubHost::new(token);
                if host.validate_credential().await {
                    eprintln!("{}", style::success("Token accepted by GitHub"));
                    if host.repository_exists(&name).await {
                        failures += 1;
                        eprintln!(
                            "{}",
                            style::error(&format!(
                                "Repository '{name}' already exists on this account"
                            ))
                        );
                    } else {
                        eprintln!(
                            "{}",
                            style::success(&format!("Repository name '{name}' is free"))
                        );
                    }
                } else {
                    failures += 1;
                    eprintln!("{}", style::error("Token rejected by GitHub"));
                }
            }
            None => eprintln!(
                "{}",
                style::hint("Hint: Skipping live checks without a usable token.")
            ),
        }
    }

    eprintln!();
    if failures > 0 {
        bail!("{failures} check(s) failed");
    }
    eprintln!("{}", style::success("All checks passed"));
    Ok(())
}
