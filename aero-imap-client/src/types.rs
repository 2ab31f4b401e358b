use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Cleartext TCP, usually port 143
    Plain,
    /// TLS from the first byte (IMAPS), usually port 993
    Tls,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Tls => f.write_str("tls"),
        }
    }
}

/// One piece of an untagged response, as it was framed on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Bytes of a response line, CRLF excluded
    Plain(Vec<u8>),
    /// A line ending with a literal announcement (`{n}`), and the `n` octets
    /// of the literal that followed it
    Continuation { header: Vec<u8>, body: Vec<u8> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    No,
    Bad,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::No => f.write_str("NO"),
            Self::Bad => f.write_str("BAD"),
        }
    }
}

/// The tagged line closing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub status: Status,
    pub text: String,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Untagged {
    /// Upper-cased response name: `FETCH`, `EXISTS`, `LIST`, `OK`, `BYE`...
    pub kind: String,
    /// The response without its leading `* `
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub completion: Completion,
    pub untagged: Vec<Untagged>,
}

impl Response {
    pub fn new(completion: Completion) -> Self {
        Self {
            completion,
            untagged: vec![],
        }
    }

    pub fn ok(text: &str) -> Self {
        Self::new(Completion {
            status: Status::Ok,
            text: text.to_string(),
        })
    }

    pub fn no(text: &str) -> Self {
        Self::new(Completion {
            status: Status::No,
            text: text.to_string(),
        })
    }

    pub fn with_untagged(mut self, kind: &str, segments: Vec<Segment>) -> Self {
        self.untagged.push(Untagged {
            kind: kind.to_ascii_uppercase(),
            segments,
        });
        self
    }

    pub fn is_ok(&self) -> bool {
        self.completion.status == Status::Ok
    }

    /// Segments of every untagged response of the given kind, in arrival order.
    pub fn data(&self, kind: &str) -> Vec<Segment> {
        self.untagged
            .iter()
            .filter(|u| u.kind.eq_ignore_ascii_case(kind))
            .flat_map(|u| u.segments.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_keeps_arrival_order_and_filters_kind() {
        let resp = Response::ok("done")
            .with_untagged("fetch", vec![Segment::Plain(b"1 FETCH (A)".to_vec())])
            .with_untagged("EXISTS", vec![Segment::Plain(b"2 EXISTS".to_vec())])
            .with_untagged(
                "FETCH",
                vec![
                    Segment::Continuation {
                        header: b"2 FETCH (B {1}".to_vec(),
                        body: b"x".to_vec(),
                    },
                    Segment::Plain(b")".to_vec()),
                ],
            );

        let fetched = resp.data("FETCH");
        assert_eq!(fetched.len(), 3);
        assert_eq!(fetched[0], Segment::Plain(b"1 FETCH (A)".to_vec()));
        assert_eq!(fetched[2], Segment::Plain(b")".to_vec()));
        assert!(resp.is_ok());
        assert!(!Response::no("nope").is_ok());
    }
}
