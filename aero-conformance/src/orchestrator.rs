use std::path::PathBuf;

use aero_imap_client::{Error as ClientError, Response};
use thiserror::Error;

use crate::backend::{Connector, ImapBackend};
use crate::config::ServerProfile;
use crate::failure::{Failure, FailureTracker};
use crate::pipeline::process_message;

/// Errors that end the run of a profile
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("unable to connect to {peer}: {source}")]
    Connect { peer: String, source: ClientError },
    #[error("login refused: {0}")]
    Login(String),
    #[error("unable to {action} mailbox {mailbox}: {text}")]
    Mailbox {
        action: &'static str,
        mailbox: String,
        text: String,
    },
    #[error("connection lost: {0}")]
    Transport(#[from] ClientError),
}

#[derive(Debug)]
pub struct RunReport {
    pub profile: String,
    pub processed: usize,
    pub succeeded: usize,
    pub failures: Vec<Failure>,
}

/// One authenticated connection to the server of a profile.
pub struct Session<'a, B: ImapBackend> {
    backend: B,
    profile: &'a ServerProfile,
    selected: bool,
}

impl<'a, B: ImapBackend> Session<'a, B> {
    pub fn new(backend: B, profile: &'a ServerProfile) -> Self {
        Self {
            backend,
            profile,
            selected: false,
        }
    }

    pub async fn authenticate(&mut self) -> Result<(), ProfileError> {
        let resp = self
            .backend
            .login(&self.profile.user, &self.profile.password)
            .await?;
        if !resp.is_ok() {
            return Err(ProfileError::Login(resp.completion.to_string()));
        }
        tracing::info!(profile=%self.profile.id, user=%self.profile.user, "authenticated");
        Ok(())
    }

    /// Start from an empty scratch mailbox and select it.
    pub async fn reset_mailbox(&mut self) -> Result<(), ProfileError> {
        let mailbox = self.profile.mailbox.as_str();

        // NO here mostly means the mailbox does not exist yet
        let deleted = self.backend.delete(mailbox).await?;
        if !deleted.is_ok() {
            tracing::debug!(profile=%self.profile.id, mailbox=%mailbox, completion=%deleted.completion, "delete refused, ignored");
        }

        let created = self.backend.create(mailbox).await?;
        self.require_ok("create", created)?;

        let selected = self.backend.select(mailbox).await?;
        self.require_ok("select", selected)?;
        self.selected = true;

        tracing::info!(profile=%self.profile.id, mailbox=%mailbox, "mailbox reset");
        Ok(())
    }

    /// Push every message of the corpus through the pipeline, in order.
    pub async fn process(&mut self, corpus: &[PathBuf]) -> Result<RunReport, ProfileError> {
        let mut tracker = FailureTracker::new();
        let mut succeeded = 0;

        for (index, message) in corpus.iter().enumerate() {
            if process_message(&mut self.backend, self.profile, index, message, &mut tracker).await? {
                succeeded += 1;
            }
        }

        Ok(RunReport {
            profile: self.profile.id.clone(),
            processed: corpus.len(),
            succeeded,
            failures: tracker.into_failures(),
        })
    }

    /// Best effort: a failure here changes nothing to the artifacts.
    pub async fn teardown(mut self) {
        if self.selected {
            match self.backend.close().await {
                Ok(resp) if !resp.is_ok() => {
                    tracing::warn!(profile=%self.profile.id, completion=%resp.completion, "close refused")
                }
                Err(err) => tracing::warn!(profile=%self.profile.id, err=%err, "close failed"),
                _ => (),
            }
        }

        match self.backend.logout().await {
            Ok(_) => tracing::debug!(profile=%self.profile.id, "logged out"),
            Err(err) => tracing::warn!(profile=%self.profile.id, err=%err, "logout failed"),
        }
    }

    fn require_ok(&self, action: &'static str, resp: Response) -> Result<(), ProfileError> {
        if resp.is_ok() {
            return Ok(());
        }
        Err(ProfileError::Mailbox {
            action,
            mailbox: self.profile.mailbox.clone(),
            text: resp.completion.to_string(),
        })
    }
}

/// Connect, authenticate, reset the scratch mailbox, process the corpus and
/// disconnect. The connection is closed even when the run failed half way.
pub async fn run_profile<C: Connector>(
    connector: &C,
    profile: &ServerProfile,
    corpus: &[PathBuf],
) -> Result<RunReport, ProfileError> {
    tracing::info!(profile=%profile.id, host=%profile.host, port=profile.port, transport=%profile.transport, messages=corpus.len(), "starting profile");

    let backend = connector
        .connect(profile)
        .await
        .map_err(|source| ProfileError::Connect {
            peer: format!("{}:{}", profile.host, profile.port),
            source,
        })?;

    let mut session = Session::new(backend, profile);
    let outcome = match session.authenticate().await {
        Ok(()) => match session.reset_mailbox().await {
            Ok(()) => session.process(corpus).await,
            Err(err) => Err(err),
        },
        Err(err) => Err(err),
    };
    session.teardown().await;

    if let Ok(report) = &outcome {
        tracing::info!(profile=%profile.id, processed=report.processed, succeeded=report.succeeded, failed=report.failures.len(), "profile done");
    }
    outcome
}
