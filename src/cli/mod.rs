pub mod check;
pub mod keep;
pub mod up;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

/// Environment variable consulted for the access token when neither the
/// command line nor the saved preferences name one.
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

pub const DEFAULT_COMMIT_MESSAGE: &str = "Initial commit: add all files and subfolders";

#[derive(Parser)]
#[command(name = "hoist")]
#[command(about = "Create a GitHub repository from a local folder and push it in one step")]
#[command(version)]
pub struct Cli {
    /// Mirror the log stream to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish a folder as a brand-new repository: create, commit, push
    Up {
        /// Folder to publish (defaults to the current directory)
        folder: Option<PathBuf>,

        /// Repository name (defaults to the folder name)
        #[arg(short, long)]
        name: Option<String>,

        /// Create a public repository instead of a private one
        #[arg(long)]
        public: bool,

        /// Repository description
        #[arg(short, long)]
        description: Option<String>,

        /// Message for the initial commit
        #[arg(short, long)]
        message: Option<String>,

        /// Branch name to push
        #[arg(short, long)]
        branch: Option<String>,

        /// Remote name to configure
        #[arg(long)]
        remote: Option<String>,

        /// Environment variable that holds the access token
        #[arg(long)]
        token_env: Option<String>,
    },

    /// Check a folder, name and token without creating anything
    Check {
        /// Folder to check (defaults to the current directory)
        folder: Option<PathBuf>,

        /// Repository name to check (defaults to the folder name)
        #[arg(short, long)]
        name: Option<String>,

        /// Environment variable that holds the access token
        #[arg(long)]
        token_env: Option<String>,

        /// Also ask the API: is the token valid, is the name free
        #[arg(long)]
        live: bool,
    },

    /// Write placeholder files into empty folders so git keeps them
    Keep {
        /// Folder to process (defaults to the current directory)
        folder: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Up {
                folder,
                name,
                public,
                description,
                message,
                branch,
                remote,
                token_env,
            } => {
                up::run(up::UpOptions {
                    folder,
                    name,
                    public,
                    description,
                    message,
                    branch,
                    remote,
                    token_env,
                })
                .await
            }
            Commands::Check {
                folder,
                name,
                token_env,
                live,
            } => check::run(folder, name, token_env, live).await,
            Commands::Keep { folder } => keep::run(folder).await,
        }
    }
}

pub(crate) fn folder_or_cwd(folder: Option<PathBuf>) -> Result<PathBuf> {
    let folder = match folder {
        Some(folder) => folder,
        None => std::env::current_dir().context("Could not determine the current directory")?,
    };
    folder
        .canonicalize()
        .with_context(|| format!("Folder does not exist: {}", folder.display()))
}

pub(crate) fn name_from_folder(folder: &Path) -> Result<String> {
    folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| {
            format!(
                "Could not derive a repository name from {}; pass --name",
                folder.display()
            )
        })
}

/// Resolve the access token from the environment. The token is only ever
/// read from an environment variable, never from an argument or a file.
pub(crate) fn token_from_env(var: &str) -> Result<String> {
    std::env::var(var).with_context(|| {
        format!(
            "Access token not found. Set the {var} environment variable.\n\
             Hint: export {var}=<your GitHub personal access token>"
        )
    })
}
