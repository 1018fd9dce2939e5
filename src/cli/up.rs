use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::warn;

use super::{
    DEFAULT_COMMIT_MESSAGE, DEFAULT_TOKEN_ENV, folder_or_cwd, name_from_folder, token_from_env,
};
use crate::core::prefs::Prefs;
use crate::core::runner::MigrationRunner;
use crate::core::style;
use crate::core::workflow::{DEFAULT_BRANCH, DEFAULT_REMOTE, MigrationRequest, Visibility};
use crate::providers::github::GithubHost;

pub struct UpOptions {
    pub folder: Option<PathBuf>,
    pub name: Option<String>,
    pub public: bool,
    pub description: Option<String>,
    pub message: Option<String>,
    pub branch: Option<String>,
    pub remote: Option<String>,
    pub token_env: Option<String>,
}

pub async fn run(options: UpOptions) -> Result<()> {
    let mut prefs = Prefs::load();

    // Resolve the folder, the name and the token before anything runs
    let folder = folder_or_cwd(options.folder)?;
    let name = match options.name {
        Some(name) => name,
        None => name_from_folder(&folder)?,
    };
    let token_env = options
        .token_env
        .or_else(|| prefs.token_env.clone())
        .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string());
    let token = token_from_env(&token_env)?;

    let visibility = if options.public || prefs.public_by_default {
        Visibility::Public
    } else {
        Visibility::Private
    };

    let request = MigrationRequest {
        folder: folder.clone(),
        token,
        name: name.clone(),
        visibility,
        description: options.description,
        commit_message: options
            .message
            .or_else(|| prefs.default_message.clone())
            .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
        branch: options
            .branch
            .or_else(|| prefs.default_branch.clone())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        remote: options
            .remote
            .or_else(|| prefs.default_remote.clone())
            .unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
    };

    eprintln!("{}", style::banner(&folder.display().to_string(), &name));
    eprintln!("{}", style::summary_line("Visibility", request.visibility.word()));
    eprintln!("{}", style::summary_line("Branch", &request.branch));
    eprintln!("{}", style::summary_line("Remote", &request.remote));
    eprintln!();

    // The worker owns the run; this side just renders its events
    let host = Arc::new(GithubHost::new(request.token.clone()));
    let runner = MigrationRunner::new();
    let mut running = runner.try_start(request, host)?;

    while let Some(event) = running.events.recv().await {
        eprintln!(
            "{}",
            style::progress_line(&event.text, event.is_error, event.percent)
        );
    }

    let report = running.wait().await?;

    if !report.succeeded() {
        bail!("migration did not complete; see the messages above");
    }

    eprintln!();
    if let Some(remote) = &report.remote {
        if let Some(commit) = &report.commit_id {
            eprintln!(
                "{}",
                style::summary_line("Commit", &style::commit_hash(&commit[..7.min(commit.len())]))
            );
        }
        if let Some(staged) = report.staged {
            eprintln!(
                "{}",
                style::summary_line(
                    "Pushed",
                    &format!("{} file(s), {}", staged.files, style::human_bytes(staged.bytes))
                )
            );
        }
        eprintln!("{}", style::summary_line("URL", &style::url(&remote.clone_url)));
    }

    prefs.last_folder = Some(folder);
    prefs.last_repository = Some(name);
    prefs.token_env = Some(token_env);
    if let Err(err) = prefs.save() {
        warn!("could not save preferences: {:#}", err);
    }
    Ok(())
}
