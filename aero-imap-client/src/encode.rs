use imap_codec::encode::{Encoder, Fragment};
use imap_codec::imap_types::command::{Command, CommandBody};
use imap_codec::imap_types::fetch::MessageDataItemName;
use imap_codec::CommandCodec;

use super::error::{Error, Result};

/// Fetch attributes the client knows how to ask for, eg. `(BODY)` or
/// `BODYSTRUCTURE ENVELOPE`.
pub fn item_names(items: &str) -> Result<Vec<MessageDataItemName<'static>>> {
    let names = items
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split_whitespace()
        .map(|name| match name.to_ascii_uppercase().as_str() {
            "BODY" => Ok(MessageDataItemName::Body),
            "BODYSTRUCTURE" => Ok(MessageDataItemName::BodyStructure),
            "ENVELOPE" => Ok(MessageDataItemName::Envelope),
            "FLAGS" => Ok(MessageDataItemName::Flags),
            "INTERNALDATE" => Ok(MessageDataItemName::InternalDate),
            "RFC822.SIZE" => Ok(MessageDataItemName::Rfc822Size),
            "UID" => Ok(MessageDataItemName::Uid),
            _ => Err(Error::Encode(format!("unsupported fetch item `{}`", name))),
        })
        .collect::<Result<Vec<_>>>()?;

    if names.is_empty() {
        return Err(Error::Encode(format!("no fetch item in `{}`", items)));
    }
    Ok(names)
}

/// What must be written on the socket, in order. A synchronizing literal
/// can only be sent once the server answered the line announcing it with a
/// continuation request.
pub fn fragments(command: &Command<'_>) -> Vec<Fragment> {
    CommandCodec::new().encode(command).collect()
}

/// A printable version of the command, for traces. Credentials never make it
/// to the logs.
pub fn summary(command: &Command<'_>) -> String {
    let tag: &str = command.tag.as_ref();
    match &command.body {
        CommandBody::Login { .. } => format!("{} LOGIN <redacted>", tag),
        CommandBody::Append { .. } => format!("{} APPEND <literal>", tag),
        _ => {
            let line = fragments(command)
                .into_iter()
                .find_map(|f| match f {
                    Fragment::Line { data } => Some(data),
                    Fragment::Literal { .. } => None,
                })
                .unwrap_or_default();
            String::from_utf8_lossy(&line).trim_end().to_string()
        }
    }
}
