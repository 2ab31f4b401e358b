use imap_codec::decode::Decoder;
use imap_codec::fragmentizer::{FragmentInfo, Fragmentizer, LineEnding};
use imap_codec::imap_types::response::{
    GreetingKind, Response as ImapResponse, Status as ImapStatus, StatusKind,
};
use imap_codec::{GreetingCodec, ResponseCodec};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1},
    combinator::map,
    sequence::{pair, preceded},
    IResult,
};

use super::error::{Error, Result};
use super::types::*;

/// One complete server message, split on its literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Line ending excluded, each literal attached to the line announcing it
    pub segments: Vec<Segment>,
    /// The message as received, for the codec
    raw: Vec<u8>,
}

/// What a frame means to a client waiting for its command completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Untagged(Untagged),
    /// `+ ...`, the server waits for a literal
    ContinuationRequest,
    Tagged(String, Completion),
}

/// Cuts the bytes read from the socket into frames.
pub struct Framer {
    fragmentizer: Fragmentizer,
    segments: Vec<Segment>,
    header: Option<Vec<u8>>,
}

impl Framer {
    pub fn new(max_message_size: u32) -> Self {
        Self {
            fragmentizer: Fragmentizer::new(max_message_size),
            segments: Vec::new(),
            header: None,
        }
    }

    pub fn enqueue(&mut self, bytes: &[u8]) {
        self.fragmentizer.enqueue_bytes(bytes);
    }

    /// `Ok(None)` until enough bytes were enqueued to complete a message.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        while let Some(info) = self.fragmentizer.progress() {
            let bytes = self.fragmentizer.fragment_bytes(info);
            match info {
                FragmentInfo::Line {
                    announcement: Some(_),
                    ending,
                    ..
                } => self.header = Some(strip_ending(bytes, ending).to_vec()),
                FragmentInfo::Line {
                    announcement: None,
                    ending,
                    ..
                } => self
                    .segments
                    .push(Segment::Plain(strip_ending(bytes, ending).to_vec())),
                FragmentInfo::Literal { .. } => self.segments.push(Segment::Continuation {
                    header: self.header.take().unwrap_or_default(),
                    body: bytes.to_vec(),
                }),
            }

            if self.fragmentizer.is_message_complete() {
                let segments = std::mem::take(&mut self.segments);
                if self.fragmentizer.is_max_message_size_exceeded() {
                    return Err(Error::Malformed(format!(
                        "server message bigger than {} bytes",
                        self.fragmentizer.message_bytes().len()
                    )));
                }
                return Ok(Some(Frame {
                    segments,
                    raw: self.fragmentizer.message_bytes().to_vec(),
                }));
            }
        }
        Ok(None)
    }
}

fn strip_ending(line: &[u8], ending: LineEnding) -> &[u8] {
    let len = match ending {
        LineEnding::CrLf => 2,
        LineEnding::Lf => 1,
    };
    &line[..line.len().saturating_sub(len)]
}

impl Frame {
    /// Bytes of the first line, line ending excluded
    pub fn first_line(&self) -> &[u8] {
        match self.segments.first() {
            Some(Segment::Plain(line)) => line,
            Some(Segment::Continuation { header, .. }) => header,
            None => &[],
        }
    }

    /// Only a server greeting in `OK` or `PREAUTH` lets the session start.
    pub fn greeting(&self) -> Result<String> {
        let text = status_text(self.first_line());
        match GreetingCodec::new().decode(&self.raw) {
            Ok((_, greeting)) if greeting.kind == GreetingKind::Bye => Err(Error::Greeting(text)),
            Ok(_) => Ok(text),
            Err(_) => Err(Error::Greeting(
                String::from_utf8_lossy(self.first_line()).into_owned(),
            )),
        }
    }

    pub fn into_line(self) -> Result<Line> {
        let first = self.first_line();
        if first.starts_with(b"+") {
            return Ok(Line::ContinuationRequest);
        }
        if let Some(data) = first.strip_prefix(b"* ") {
            let kind = untagged_kind(data)
                .map(|(_, kind)| kind)
                .unwrap_or_default();
            let mut segments = self.segments;
            // `* ` is not part of the data
            match segments.first_mut() {
                Some(Segment::Plain(line)) | Some(Segment::Continuation { header: line, .. }) => {
                    line.drain(..2);
                }
                None => (),
            }
            return Ok(Line::Untagged(Untagged { kind, segments }));
        }

        let malformed = || Error::Malformed(String::from_utf8_lossy(first).into_owned());
        match ResponseCodec::new().decode(&self.raw) {
            Ok((_, ImapResponse::Status(ImapStatus::Tagged(tagged)))) => {
                let status = match tagged.body.kind {
                    StatusKind::Ok => Status::Ok,
                    StatusKind::No => Status::No,
                    StatusKind::Bad => Status::Bad,
                };
                Ok(Line::Tagged(
                    AsRef::<str>::as_ref(&tagged.tag).to_string(),
                    Completion {
                        status,
                        text: status_text(first),
                    },
                ))
            }
            _ => Err(malformed()),
        }
    }
}

/// What follows `<tag> <status> `, response code included: the server's own
/// wording is what gets logged and reported.
fn status_text(line: &[u8]) -> String {
    let text = line.splitn(3, |c| *c == b' ').nth(2).unwrap_or_default();
    String::from_utf8_lossy(text).into_owned()
}

fn response_name(input: &[u8]) -> IResult<&[u8], String> {
    map(
        take_while1(|c: u8| c.is_ascii_alphabetic() || c == b'-'),
        |name: &[u8]| String::from_utf8_lossy(name).to_ascii_uppercase(),
    )(input)
}

/// Name of an untagged response, given the line without its `* ` prefix:
/// `12 FETCH (...)` is a `FETCH`, `LIST (\HasNoChildren) ...` is a `LIST`.
/// The data itself is left alone, servers under test do not always follow
/// the grammar.
pub fn untagged_kind(input: &[u8]) -> IResult<&[u8], String> {
    alt((
        preceded(pair(digit1, char(' ')), response_name),
        response_name,
    ))(input)
}
