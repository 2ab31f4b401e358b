use std::path::Path;

use aero_imap_client::{Error as ClientError, Response};
use thiserror::Error;

use crate::backend::ImapBackend;
use crate::canonical::canonicalize;
use crate::config::ServerProfile;
use crate::corpus::artifact_path;
use crate::failure::{Failure, FailureTracker, Stage};

/// What we ask the server about each message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataItem {
    Body,
    BodyStructure,
}

impl DataItem {
    pub const ALL: [DataItem; 2] = [DataItem::Body, DataItem::BodyStructure];

    pub fn fetch_items(&self) -> &'static str {
        match self {
            Self::Body => "(BODY)",
            Self::BodyStructure => "(BODYSTRUCTURE)",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::BodyStructure => "bodystructure",
        }
    }
}

#[derive(Debug, Error)]
enum MessageError {
    #[error("{stage} refused: {text}")]
    Rejected { stage: Stage, text: String },
    #[error("no parenthesized data in the {} response", .0.extension())]
    Anomaly(DataItem),
    #[error("{stage} failed: {source}")]
    Io {
        stage: Stage,
        source: std::io::Error,
    },
    #[error(transparent)]
    Transport(#[from] ClientError),
}

impl MessageError {
    fn stage(&self) -> Option<Stage> {
        match self {
            Self::Rejected { stage, .. } | Self::Io { stage, .. } => Some(*stage),
            Self::Anomaly(item) => Some(Stage::Fetch(*item)),
            Self::Transport(_) => None,
        }
    }
}

/// Append one message, fetch what the server made of it and store the
/// canonical answers beside the message.
///
/// A problem limited to this message is recorded in `tracker` and `Ok(false)`
/// is returned so the caller moves on. Transport errors are returned as is:
/// the connection is unusable after them.
pub async fn process_message<B: ImapBackend + ?Sized>(
    backend: &mut B,
    profile: &ServerProfile,
    index: usize,
    message: &Path,
    tracker: &mut FailureTracker,
) -> Result<bool, ClientError> {
    match run(backend, profile, index, message, tracker).await {
        Ok(seq) => {
            tracing::info!(profile=%profile.id, message=%message.display(), seq=seq, "artifacts written");
            Ok(true)
        }
        Err(MessageError::Transport(err)) => Err(err),
        Err(err) => {
            let stage = err.stage().unwrap_or(Stage::Append);
            if let MessageError::Anomaly(item) = &err {
                tracing::warn!(profile=%profile.id, message=%message.display(), item=item.extension(), "server answered without any parenthesized data, artifact not written");
            } else {
                tracing::warn!(profile=%profile.id, message=%message.display(), err=%err, "message failed");
            }
            tracker.record(Failure {
                message: message.to_path_buf(),
                index,
                stage,
                reason: err.to_string(),
            });
            Ok(false)
        }
    }
}

async fn run<B: ImapBackend + ?Sized>(
    backend: &mut B,
    profile: &ServerProfile,
    index: usize,
    message: &Path,
    tracker: &FailureTracker,
) -> Result<u32, MessageError> {
    let content = tokio::fs::read(message)
        .await
        .map_err(|source| MessageError::Io {
            stage: Stage::Read,
            source,
        })?;

    let appended = backend.append(&profile.mailbox, &content).await?;
    require_ok(&appended, Stage::Append)?;

    let seq = tracker.next_sequence(index);
    let sequence_set = format!("{}:{}", seq, seq);
    tracing::debug!(profile=%profile.id, message=%message.display(), seq=seq, "appended");

    for item in DataItem::ALL {
        let fetched = backend.fetch(&sequence_set, item.fetch_items()).await?;
        require_ok(&fetched, Stage::Fetch(item))?;

        let artifact = canonicalize(&fetched.data("FETCH"));
        if artifact.is_empty() {
            return Err(MessageError::Anomaly(item));
        }

        let target = artifact_path(message, &profile.suffix, item);
        tokio::fs::write(&target, &artifact)
            .await
            .map_err(|source| MessageError::Io {
                stage: Stage::Write(item),
                source,
            })?;
        tracing::trace!(path=%target.display(), len=artifact.len(), "artifact stored");
    }

    Ok(seq)
}

fn require_ok(response: &Response, stage: Stage) -> Result<(), MessageError> {
    if response.is_ok() {
        return Ok(());
    }
    Err(MessageError::Rejected {
        stage,
        text: response.completion.to_string(),
    })
}
