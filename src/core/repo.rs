use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use git2::{Cred, IndexAddOption, PushOptions, RemoteCallbacks, Repository, Signature};

use crate::core::markers;

/// What `stage_all` put in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    /// Number of index entries after staging.
    pub files: usize,
    /// Summed on-disk sizes of the staged files, in bytes.
    pub bytes: u64,
}

/// Git repository wrapper for the migration.
///
/// All git interactions go through this struct so the rest of the codebase
/// doesn't need to deal with git2 directly. Operations are sequential and
/// invoked from the single migration worker, in pipeline order.
pub struct LocalRepo {
    repo: Repository,
    root: PathBuf,
}

impl LocalRepo {
    /// Initialize a git repository at the given path, or reopen the one
    /// already there (git init is reentrant).
    pub fn init(path: &Path) -> Result<Self> {
        let repo = Repository::init(path)
            .with_context(|| format!("Failed to init git repo at {}", path.display()))?;

        // Canonicalize to resolve symlinks (e.g., /var -> /private/var on macOS)
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        Ok(Self { repo, root })
    }

    /// Get the repo root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ---------- Placeholders ----------

    /// Drop placeholder markers into empty leaf directories so they survive
    /// the commit. Returns how many markers were created; never fails.
    pub fn materialize_placeholders(&self) -> usize {
        markers::write_markers(&self.root)
    }

    // ---------- Staging ----------

    /// Stage everything under the working directory, respecting .gitignore,
    /// and report the exact staged file count and byte total.
    pub fn stage_all(&self) -> Result<StageSummary> {
        let mut index = self.repo.index().context("Failed to open git index")?;

        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .context("Failed to stage files")?;
        index.write().context("Failed to write git index")?;

        let mut files = 0usize;
        let mut bytes = 0u64;
        for entry in index.iter() {
            files += 1;
            let rel = String::from_utf8_lossy(&entry.path).to_string();
            // Prefer the work-tree size; the index field is only 32 bits.
            bytes += match self.root.join(&rel).metadata() {
                Ok(meta) => meta.len(),
                Err(_) => u64::from(entry.file_size),
            };
        }

        Ok(StageSummary { files, bytes })
    }

    // ---------- Commit ----------

    /// Create a commit with all staged changes.
    ///
    /// Empty and whitespace-only messages are rejected here, before git is
    /// involved. The first commit has no parent; later commits use HEAD.
    pub fn commit(&self, message: &str) -> Result<String> {
        if message.trim().is_empty() {
            bail!("Commit message cannot be empty");
        }

        let mut index = self.repo.index().context("Failed to open git index")?;
        let tree_oid = index.write_tree().context("Failed to write tree")?;
        let tree = self
            .repo
            .find_tree(tree_oid)
            .context("Failed to find tree")?;

        let sig = self.default_signature()?;

        let commit_oid = if let Ok(head) = self.repo.head() {
            let parent = head
                .peel_to_commit()
                .context("Failed to find HEAD commit")?;
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
                .context("Failed to create commit")?
        } else {
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[])
                .context("Failed to create initial commit")?
        };

        Ok(format!("{}", commit_oid))
    }

    /// Full hash of the HEAD commit, or None before the first commit.
    pub fn head_id(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        let commit = head.peel_to_commit().ok()?;
        Some(format!("{}", commit.id()))
    }

    // ---------- Remote ----------

    /// Point `name` at `url`, replacing any previous definition of the
    /// remote (delete-then-add, so re-runs never conflict).
    pub fn set_remote(&self, name: &str, url: &str) -> Result<()> {
        if self.repo.find_remote(name).is_ok() {
            self.repo
                .remote_delete(name)
                .with_context(|| format!("Failed to remove existing remote '{}'", name))?;
        }
        self.repo
            .remote(name, url)
            .with_context(|| format!("Failed to add remote '{}'", name))?;
        Ok(())
    }

    // ---------- Branch ----------

    /// Rename the branch HEAD points at. Succeeds as a no-op when the branch
    /// already has the target name.
    pub fn rename_branch(&self, name: &str) -> Result<()> {
        let head = self.repo.head().context("Failed to read HEAD")?;
        if !head.is_branch() {
            bail!("HEAD does not point to a branch");
        }

        let current = head.shorthand().unwrap_or_default().to_string();
        if current == name {
            return Ok(());
        }

        let mut branch = git2::Branch::wrap(head);
        branch
            .rename(name, true)
            .with_context(|| format!("Failed to rename branch '{}' to '{}'", current, name))?;
        self.repo
            .set_head(&format!("refs/heads/{}", name))
            .with_context(|| format!("Failed to point HEAD at '{}'", name))?;
        Ok(())
    }

    // ---------- Push ----------

    /// Push `refs/heads/<branch>` to `remote_name`, authenticating over
    /// HTTPS with the access token. Per-reference rejections reported by the
    /// remote surface as errors. On success the branch's upstream is
    /// recorded, matching `git push -u`.
    pub fn push(&self, remote_name: &str, branch: &str, token: &str) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .with_context(|| format!("Remote '{}' is not configured", remote_name))?;

        let rejected: RefCell<Option<String>> = RefCell::new(None);
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        {
            let mut callbacks = RemoteCallbacks::new();
            let secret = token.to_string();
            callbacks.credentials(move |_url, _username, _allowed| {
                Cred::userpass_plaintext("x-access-token", &secret)
            });
            callbacks.push_update_reference(|refname, status| {
                if let Some(msg) = status {
                    *rejected.borrow_mut() = Some(format!("{refname}: {msg}"));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);

            remote
                .push(&[refspec.as_str()], Some(&mut options))
                .with_context(|| format!("Failed to push '{}' to '{}'", branch, remote_name))?;
        }

        if let Some(reason) = rejected.into_inner() {
            bail!("Push rejected by the remote: {}", reason);
        }

        // Upstream tracking, the `-u` part.
        let mut config = self.repo.config().context("Failed to open git config")?;
        config
            .set_str(&format!("branch.{branch}.remote"), remote_name)
            .context("Failed to record upstream remote")?;
        config
            .set_str(&format!("branch.{branch}.merge"), &format!("refs/heads/{branch}"))
            .context("Failed to record upstream branch")?;
        Ok(())
    }

    // ---------- Internal ----------

    fn default_signature(&self) -> Result<Signature<'_>> {
        // Try to get signature from git config, fall back to defaults
        self.repo.signature().or_else(|_| {
            Signature::now("hoist", "hoist@localhost").context("Failed to create git signature")
        })
    }
}
