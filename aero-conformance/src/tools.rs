//! Helpers to prepare a corpus before running it against servers.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};

use crate::backend::ImapBackend;
use crate::corpus;

const EXPECTED_MARKER: &[u8] = b"EXPECTED STRUCTURE";

/// Parser test vectors carry the expected structure after the email itself.
/// For each `*.txt` of `dir`, write the sibling `*.eml` holding only the email.
pub async fn strip_expected(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for source in corpus::load(dir, "txt").await? {
        let content = tokio::fs::read(&source)
            .await
            .with_context(|| format!("unable to read {}", source.display()))?;
        let target = source.with_extension("eml");
        tokio::fs::write(&target, email_part(&content)).await?;
        tracing::info!(from=%source.display(), to=%target.display(), "stripped");
        written.push(target);
    }
    Ok(written)
}

fn email_part(content: &[u8]) -> &[u8] {
    let mut end = 0;
    for line in content.split_inclusive(|b| *b == b'\n') {
        if line.windows(EXPECTED_MARKER.len()).any(|w| w == EXPECTED_MARKER) {
            break;
        }
        end += line.len();
    }
    &content[..end]
}

/// Rewrite a file with CRLF line endings. A file already containing a CRLF
/// is left untouched and reported as an error.
pub async fn unix2dos(path: &Path) -> Result<()> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("unable to read {}", path.display()))?;
    if content.windows(2).any(|w| w == b"\r\n") {
        bail!("{} is already a CRLF file", path.display());
    }

    let mut converted = Vec::with_capacity(content.len() + content.len() / 32);
    for b in content {
        if b == b'\n' {
            converted.push(b'\r');
        }
        converted.push(b);
    }
    tokio::fs::write(path, converted).await?;
    Ok(())
}

/// Split an mbox into its messages. The `From ` separator lines are not part
/// of the messages, every other line is kept as stored, `>From ` quoting
/// included.
pub fn split_mbox(mbox: &[u8]) -> Vec<Vec<u8>> {
    let mut messages: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<Vec<u8>> = None;

    for line in mbox.split_inclusive(|b| *b == b'\n') {
        if line.starts_with(b"From ") {
            if let Some(done) = current.take() {
                messages.push(trim_separator(done));
            }
            current = Some(Vec::new());
            continue;
        }
        // text before the first separator is not a message
        let Some(msg) = current.as_mut() else { continue };
        msg.extend_from_slice(line);
    }
    if let Some(done) = current {
        messages.push(trim_separator(done));
    }
    messages
}

// The blank line before a separator belongs to the mbox, not to the message
fn trim_separator(mut msg: Vec<u8>) -> Vec<u8> {
    if msg.ends_with(b"\r\n\r\n") {
        msg.truncate(msg.len() - 2);
    } else if msg.ends_with(b"\n\n") {
        msg.truncate(msg.len() - 1);
    }
    msg
}

/// Log in, select `mailbox` and append every message to it.
/// Returns how many messages the server accepted.
pub async fn mbox_to_imap<B: ImapBackend>(
    backend: &mut B,
    user: &str,
    password: &str,
    mailbox: &str,
    messages: &[Vec<u8>],
) -> Result<usize> {
    let login = backend.login(user, password).await?;
    if !login.is_ok() {
        bail!("login refused: {}", login.completion);
    }
    let select = backend.select(mailbox).await?;
    if !select.is_ok() {
        return Err(anyhow!("unable to select {}: {}", mailbox, select.completion));
    }

    let total = messages.len();
    let mut accepted = 0;
    for (k, message) in messages.iter().enumerate() {
        let resp = backend.append(mailbox, message).await?;
        if resp.is_ok() {
            accepted += 1;
        } else {
            tracing::warn!(message=k, completion=%resp.completion, "append refused");
        }
        tracing::info!("{}/{}", k + 1, total);
    }

    if let Err(err) = backend.logout().await {
        tracing::warn!(err=%err, "logout failed");
    }
    Ok(accepted)
}
