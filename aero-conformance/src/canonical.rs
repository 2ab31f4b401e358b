//! Fold the raw segments of a FETCH response into the bytes we store.
//!
//! Servers are free to send a parenthesized list inline or to move part of
//! it into a literal. Once folded, both framings give the same bytes:
//!
//! ```text
//! Plain(b"1 FETCH (BODY (\"text\" \"plain\" NIL NIL NIL \"7bit\" 9 1))")
//!   -> (BODY ("text" "plain" NIL NIL NIL "7bit" 9 1))
//! ```
//!
//! The artifact starts at the first `(` of the folded buffer. Anything
//! before it, including a `(` that would appear inside a quoted string of
//! the response prefix, is dropped. Recorded artifacts rely on this rule.

use aero_imap_client::Segment;

const CRLF: &[u8] = b"\r\n";

/// Returns an empty buffer when no `(` was found.
pub fn canonicalize(segments: &[Segment]) -> Vec<u8> {
    let mut folded = Vec::new();
    for segment in segments {
        match segment {
            Segment::Continuation { header, body } => {
                folded.extend_from_slice(header);
                folded.extend_from_slice(CRLF);
                folded.extend_from_slice(body);
            }
            Segment::Plain(bytes) => folded.extend_from_slice(bytes),
        }
    }

    match folded.iter().position(|b| *b == b'(') {
        Some(start) => folded.split_off(start),
        None => Vec::new(),
    }
}
