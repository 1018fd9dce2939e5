//! The migration pipeline.
//!
//! A strictly linear sequence of phases from input validation to push. The
//! first hard failure stops the run: nothing is rolled back, and the failure
//! messaging spells out what already happened on the remote side. The one
//! soft step is the branch rename, which warns and continues.

use std::fmt;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::core::progress::ProgressEvent;
use crate::core::repo::{LocalRepo, StageSummary};
use crate::core::style;
use crate::core::validate;
use crate::providers::{RemoteHost, RemoteRepository};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_REMOTE: &str = "origin";

/// Repository visibility on the hosting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    pub fn is_private(self) -> bool {
        matches!(self, Visibility::Private)
    }

    pub fn word(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
        }
    }
}

/// Everything one migration needs, fixed before the pipeline starts.
#[derive(Debug, Clone)]
pub struct MigrationRequest {
    pub folder: PathBuf,
    pub token: String,
    pub name: String,
    pub visibility: Visibility,
    pub description: Option<String>,
    pub commit_message: String,
    pub branch: String,
    pub remote: String,
}

/// Pipeline states, in execution order. `Failed` is terminal and reachable
/// from every working phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ValidatingInput,
    CreatingRemote,
    InitializingLocal,
    MaterializingPlaceholders,
    Staging,
    Committing,
    SettingRemote,
    RenamingBranch,
    Pushing,
    Succeeded,
    Failed,
}

/// The working phases, in order. Percent values come from positions here.
const PIPELINE: [Phase; 9] = [
    Phase::ValidatingInput,
    Phase::CreatingRemote,
    Phase::InitializingLocal,
    Phase::MaterializingPlaceholders,
    Phase::Staging,
    Phase::Committing,
    Phase::SettingRemote,
    Phase::RenamingBranch,
    Phase::Pushing,
];

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::ValidatingInput => "Validating input",
            Phase::CreatingRemote => "Creating remote repository",
            Phase::InitializingLocal => "Initializing local repository",
            Phase::MaterializingPlaceholders => "Adding placeholders to empty folders",
            Phase::Staging => "Staging files",
            Phase::Committing => "Creating commit",
            Phase::SettingRemote => "Configuring remote",
            Phase::RenamingBranch => "Renaming branch",
            Phase::Pushing => "Pushing",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn percent_entering(phase: Phase) -> Option<u8> {
    let idx = PIPELINE.iter().position(|p| *p == phase)?;
    Some((idx * 100 / PIPELINE.len()) as u8)
}

fn percent_completing(phase: Phase) -> Option<u8> {
    let idx = PIPELINE.iter().position(|p| *p == phase)?;
    Some(((idx + 1) * 100 / PIPELINE.len()) as u8)
}

/// Outcome of one pipeline operation.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub phase: Phase,
    pub succeeded: bool,
    pub message: String,
    /// Underlying error chain, when there is one.
    pub detail: Option<String>,
}

/// What one run produced, handed back when the worker task finishes.
#[derive(Debug)]
pub struct WorkflowReport {
    pub final_phase: Phase,
    pub steps: Vec<StepResult>,
    pub remote: Option<RemoteRepository>,
    pub markers_created: usize,
    pub staged: Option<StageSummary>,
    pub commit_id: Option<String>,
}

impl WorkflowReport {
    pub fn succeeded(&self) -> bool {
        self.final_phase == Phase::Succeeded
    }

    /// The step that stopped the run, if it failed.
    pub fn failure(&self) -> Option<&StepResult> {
        if self.succeeded() {
            return None;
        }
        self.steps.iter().rev().find(|s| !s.succeeded)
    }
}

/// One migration run. Consumed by `run`; a new request needs a new workflow.
pub struct Workflow {
    request: MigrationRequest,
    events: mpsc::Sender<ProgressEvent>,
    phase: Phase,
    steps: Vec<StepResult>,
    remote: Option<RemoteRepository>,
    markers_created: usize,
    staged: Option<StageSummary>,
    commit_id: Option<String>,
}

impl Workflow {
    pub fn new(request: MigrationRequest, events: mpsc::Sender<ProgressEvent>) -> Self {
        Self {
            request,
            events,
            phase: Phase::Idle,
            steps: Vec::new(),
            remote: None,
            markers_created: 0,
            staged: None,
            commit_id: None,
        }
    }

    pub async fn run(mut self, host: &dyn RemoteHost) -> WorkflowReport {
        info!(
            "migration started: {} -> '{}'",
            self.request.folder.display(),
            self.request.name
        );

        self.enter(Phase::ValidatingInput).await;
        if let Err(err) = self.validate_input() {
            return self.fail(err.to_string(), None).await;
        }
        self.step_ok("Input validated".to_string()).await;

        self.enter(Phase::CreatingRemote).await;
        if !host.validate_credential().await {
            return self
                .fail("Authentication failed. Check your access token.".to_string(), None)
                .await;
        }
        if host.repository_exists(&self.request.name).await {
            let message = format!(
                "Repository '{}' already exists on this account",
                self.request.name
            );
            return self.fail(message, None).await;
        }
        let remote = match host
            .create_repository(
                &self.request.name,
                self.request.visibility.is_private(),
                self.request.description.as_deref(),
            )
            .await
        {
            Ok(remote) => remote,
            Err(err) => return self.fail(err.to_string(), None).await,
        };
        self.remote = Some(remote.clone());
        self.step_ok(format!(
            "Created {} repository '{}'",
            self.request.visibility.word(),
            remote.name
        ))
        .await;

        self.enter(Phase::InitializingLocal).await;
        let repo = match LocalRepo::init(&self.request.folder) {
            Ok(repo) => repo,
            Err(err) => return self.fail_anyhow(err).await,
        };
        self.step_ok("Git repository initialized".to_string()).await;

        self.enter(Phase::MaterializingPlaceholders).await;
        let markers_created = repo.materialize_placeholders();
        self.markers_created = markers_created;
        let message = if markers_created > 0 {
            format!("Created {} placeholder file(s) in empty folders", markers_created)
        } else {
            "No empty folders found".to_string()
        };
        self.step_ok(message).await;

        self.enter(Phase::Staging).await;
        let staged = match repo.stage_all() {
            Ok(summary) => summary,
            Err(err) => return self.fail_anyhow(err).await,
        };
        self.staged = Some(staged);
        self.step_ok(format!(
            "Staged {} file(s) ({})",
            staged.files,
            style::human_bytes(staged.bytes)
        ))
        .await;

        self.enter(Phase::Committing).await;
        let commit_id = match repo.commit(&self.request.commit_message) {
            Ok(id) => id,
            Err(err) => return self.fail_anyhow(err).await,
        };
        let short = commit_id[..7.min(commit_id.len())].to_string();
        self.commit_id = Some(commit_id);
        self.step_ok(format!("Commit created ({})", short)).await;

        self.enter(Phase::SettingRemote).await;
        if let Err(err) = repo.set_remote(&self.request.remote, &remote.clone_url) {
            return self.fail_anyhow(err).await;
        }
        self.step_ok(format!(
            "Remote '{}' set to {}",
            self.request.remote, remote.clone_url
        ))
        .await;

        self.enter(Phase::RenamingBranch).await;
        match repo.rename_branch(&self.request.branch) {
            Ok(()) => {
                self.step_ok(format!("Branch renamed to '{}'", self.request.branch))
                    .await;
            }
            Err(err) => {
                self.step_soft(
                    format!(
                        "Could not rename branch (it may already be '{}')",
                        self.request.branch
                    ),
                    err,
                )
                .await;
            }
        }

        self.enter(Phase::Pushing).await;
        if let Err(err) = repo.push(
            &self.request.remote,
            &self.request.branch,
            &self.request.token,
        ) {
            return self.fail_anyhow(err).await;
        }
        self.step_ok(format!(
            "Pushed '{}' to '{}'",
            self.request.branch, self.request.remote
        ))
        .await;

        self.finish().await
    }

    fn validate_input(&self) -> Result<(), validate::InputError> {
        validate::check_folder(&self.request.folder)?;
        validate::check_repo_name(&self.request.name)?;
        validate::check_token(&self.request.token)?;
        Ok(())
    }

    // ---------- Phase bookkeeping ----------

    async fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        info!("phase: {}", phase);
        self.emit(format!("{}...", phase.label()), false, percent_entering(phase))
            .await;
    }

    async fn step_ok(&mut self, message: String) {
        self.steps.push(StepResult {
            phase: self.phase,
            succeeded: true,
            message: message.clone(),
            detail: None,
        });
        self.emit(format!("✓ {}", message), false, percent_completing(self.phase))
            .await;
    }

    async fn step_soft(&mut self, message: String, err: anyhow::Error) {
        warn!("{}: {:#}", message, err);
        self.steps.push(StepResult {
            phase: self.phase,
            succeeded: false,
            message: message.clone(),
            detail: Some(format!("{err:#}")),
        });
        self.emit(format!("Warning: {}", message), false, None).await;
    }

    async fn fail(mut self, message: String, detail: Option<String>) -> WorkflowReport {
        error!("{} failed: {}", self.phase, message);
        self.steps.push(StepResult {
            phase: self.phase,
            succeeded: false,
            message: message.clone(),
            detail,
        });
        self.emit(format!("Error: {}", message), true, None).await;

        // Spell out the partial state: a repository that exists, with nothing
        // pushed to it.
        if let Some(remote) = &self.remote {
            let note = format!(
                "Note: the remote repository '{}' was created, but nothing was pushed: {}",
                remote.name, remote.clone_url
            );
            self.emit(note, false, None).await;
        }

        self.into_report(Phase::Failed)
    }

    async fn fail_anyhow(self, err: anyhow::Error) -> WorkflowReport {
        let detail = format!("{err:#}");
        self.fail(err.to_string(), Some(detail)).await
    }

    async fn finish(mut self) -> WorkflowReport {
        self.phase = Phase::Succeeded;
        info!("migration succeeded: '{}'", self.request.name);
        self.emit("✓ Migration completed successfully".to_string(), false, Some(100))
            .await;
        if let Some(remote) = &self.remote {
            let text = format!("Repository URL: {}", remote.clone_url);
            self.emit(text, false, None).await;
        }
        self.into_report(Phase::Succeeded)
    }

    async fn emit(&self, text: String, is_error: bool, percent: Option<u8>) {
        // The owner may have dropped the receiver; the run still completes.
        let _ = self
            .events
            .send(ProgressEvent {
                text,
                is_error,
                percent,
            })
            .await;
    }

    fn into_report(self, final_phase: Phase) -> WorkflowReport {
        WorkflowReport {
            final_phase,
            steps: self.steps,
            remote: self.remote,
            markers_created: self.markers_created,
            staged: self.staged,
            commit_id: self.commit_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_spans_the_pipeline() {
        assert_eq!(percent_entering(Phase::ValidatingInput), Some(0));
        assert_eq!(percent_completing(Phase::Pushing), Some(100));
        assert_eq!(percent_entering(Phase::Idle), None);
        assert_eq!(percent_entering(Phase::Succeeded), None);

        // Monotone across the pipeline, completion above entry.
        let mut last = 0;
        for phase in PIPELINE {
            let entering = percent_entering(phase).unwrap();
            let completing = percent_completing(phase).unwrap();
            assert!(entering >= last);
            assert!(completing > entering);
            last = completing;
        }
    }

    #[test]
    fn test_visibility_defaults_to_private() {
        assert_eq!(Visibility::default(), Visibility::Private);
        assert!(Visibility::Private.is_private());
        assert!(!Visibility::Public.is_private());
        assert_eq!(Visibility::Public.word(), "public");
    }
}
