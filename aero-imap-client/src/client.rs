use std::path::PathBuf;
use std::time::Duration;

use imap_codec::encode::Fragment;
use imap_codec::imap_types::command::{Command, CommandBody};
use imap_codec::imap_types::core::LiteralMode;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufStream};
use tokio_util::bytes::BytesMut;

use crate::decode::{Frame, Framer, Line};
use crate::encode;
use crate::error::{Error, Result};
use crate::stream::{self, AnyStream};
use crate::types::*;

/// Server messages bigger than this, literals included, are a framing error
const MAX_MESSAGE_SIZE: u32 = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    /// PEM bundle used to verify the server certificate, TLS only
    pub ca_file: Option<PathBuf>,
    /// Upper bound for the greeting and for every command round-trip
    pub timeout: Duration,
}

pub struct Client {
    stream: BufStream<AnyStream>,
    framer: Framer,
    read_buf: BytesMut,
    peer: String,
    next_tag: u32,
    timeout: Duration,
}

impl Client {
    pub async fn connect(opts: &ClientOptions) -> Result<Self> {
        let peer = format!("{}:{}", opts.host, opts.port);
        let connecting = async {
            let stream = stream::open(
                opts.transport,
                opts.host.as_str(),
                opts.port,
                opts.ca_file.as_deref(),
            )
            .await?;
            Self::handshake(stream, peer.clone(), opts.timeout).await
        };

        tokio::time::timeout(opts.timeout, connecting)
            .await
            .map_err(|_| Error::Timeout(opts.timeout))?
    }

    /// Wait for the server greeting on an already established stream.
    pub async fn handshake(stream: AnyStream, peer: String, timeout: Duration) -> Result<Self> {
        let mut client = Self {
            stream: BufStream::new(stream),
            framer: Framer::new(MAX_MESSAGE_SIZE),
            read_buf: BytesMut::with_capacity(8 * 1024),
            peer,
            next_tag: 1,
            timeout,
        };

        let greeting = client.read_frame().await?.greeting()?;
        tracing::info!(peer=%client.peer, greeting=%greeting, "connected");
        Ok(client)
    }

    pub async fn login(&mut self, user: &str, password: &str) -> Result<Response> {
        let body = CommandBody::login(user, password).map_err(encode_error)?;
        self.execute(body).await
    }

    pub async fn select(&mut self, mailbox: &str) -> Result<Response> {
        let body = CommandBody::select(mailbox).map_err(encode_error)?;
        self.execute(body).await
    }

    pub async fn create(&mut self, mailbox: &str) -> Result<Response> {
        let body = CommandBody::create(mailbox).map_err(encode_error)?;
        self.execute(body).await
    }

    pub async fn delete(&mut self, mailbox: &str) -> Result<Response> {
        let body = CommandBody::delete(mailbox).map_err(encode_error)?;
        self.execute(body).await
    }

    /// APPEND without flags nor internal date: the server picks both.
    pub async fn append(&mut self, mailbox: &str, message: &[u8]) -> Result<Response> {
        let body = CommandBody::append(mailbox, vec![], None, message).map_err(encode_error)?;
        self.execute(body).await
    }

    /// eg. `3:3` and `(BODYSTRUCTURE)`. A single item goes on the wire
    /// without its parentheses.
    pub async fn fetch(&mut self, sequence_set: &str, items: &str) -> Result<Response> {
        let names = encode::item_names(items)?;
        let body = CommandBody::fetch(sequence_set, names, false).map_err(encode_error)?;
        self.execute(body).await
    }

    pub async fn close(&mut self) -> Result<Response> {
        self.execute(CommandBody::Close).await
    }

    pub async fn logout(&mut self) -> Result<Response> {
        self.execute(CommandBody::Logout).await
    }

    fn tag(&mut self) -> String {
        let tag = format!("A{:04}", self.next_tag);
        self.next_tag += 1;
        tag
    }

    async fn execute(&mut self, body: CommandBody<'_>) -> Result<Response> {
        let command = Command::new(self.tag(), body).map_err(encode_error)?;
        let timeout = self.timeout;
        tokio::time::timeout(timeout, self.exchange(&command))
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }

    async fn exchange(&mut self, command: &Command<'_>) -> Result<Response> {
        let tag: &str = command.tag.as_ref();
        tracing::trace!(peer=%self.peer, cmd=%encode::summary(command), "C:");
        let mut untagged = Vec::new();

        for fragment in encode::fragments(command) {
            match fragment {
                Fragment::Line { data } => self.stream.write_all(&data).await?,
                Fragment::Literal { data, mode } => {
                    if matches!(mode, LiteralMode::Sync) {
                        self.stream.flush().await?;
                        loop {
                            match self.read_frame().await?.into_line()? {
                                Line::ContinuationRequest => break,
                                Line::Untagged(u) => collect(command, u, &mut untagged)?,
                                // Server refused the literal, the command is over
                                Line::Tagged(t, completion) if t == tag => {
                                    return Ok(Response {
                                        completion,
                                        untagged,
                                    })
                                }
                                Line::Tagged(t, _) => return Err(unexpected_tag(tag, &t)),
                            }
                        }
                    }
                    self.stream.write_all(&data).await?;
                }
            }
        }
        self.stream.flush().await?;

        loop {
            match self.read_frame().await?.into_line()? {
                Line::Untagged(u) => collect(command, u, &mut untagged)?,
                Line::ContinuationRequest => {
                    return Err(Error::Malformed(format!(
                        "continuation request while no literal is pending for {}",
                        tag
                    )))
                }
                Line::Tagged(t, completion) if t == tag => {
                    tracing::debug!(peer=%self.peer, tag=%t, name=command.body.name(), completion=%completion, "command done");
                    return Ok(Response {
                        completion,
                        untagged,
                    });
                }
                Line::Tagged(t, _) => return Err(unexpected_tag(tag, &t)),
            }
        }
    }

    /// Read until one full server message is available. Literals are
    /// attached to the line that announced them.
    async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.framer.next_frame()? {
                tracing::trace!(peer=%self.peer, line=%String::from_utf8_lossy(frame.first_line()), "S:");
                return Ok(frame);
            }

            self.read_buf.clear();
            if self.stream.read_buf(&mut self.read_buf).await? == 0 {
                return Err(Error::Closed);
            }
            self.framer.enqueue(&self.read_buf);
        }
    }
}

fn encode_error<E: std::fmt::Debug>(err: E) -> Error {
    Error::Encode(format!("{:?}", err))
}

fn unexpected_tag(expected: &str, tag: &str) -> Error {
    Error::Malformed(format!(
        "got completion for tag {} while waiting for {}",
        tag, expected
    ))
}

fn collect(command: &Command<'_>, u: Untagged, acc: &mut Vec<Untagged>) -> Result<()> {
    if u.kind == "BYE" && !matches!(command.body, CommandBody::Logout) {
        let text = u
            .segments
            .iter()
            .map(|s| match s {
                Segment::Plain(p) => String::from_utf8_lossy(p).into_owned(),
                Segment::Continuation { header, .. } => String::from_utf8_lossy(header).into_owned(),
            })
            .collect::<String>();
        return Err(Error::Bye(text));
    }
    acc.push(u);
    Ok(())
}
