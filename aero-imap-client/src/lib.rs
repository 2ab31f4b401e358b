pub mod client;
pub mod decode;
pub mod encode;
pub mod error;
pub mod stream;

/// Just enough IMAP4rev1 to drive a server from a test bench
///
/// ## Trace
///
/// ```text
/// S: * OK [CAPABILITY IMAP4rev1] Dovecot ready.
/// C: A0001 LOGIN test pass
/// S: A0001 OK Logged in
/// C: A0002 APPEND kzUXL7HyS5OjLcU8 {24}
/// S: + OK
/// C: Subject: hi
/// C:
/// C: Body text
/// S: A0002 OK Append completed.
/// C: A0003 FETCH 1:1 BODYSTRUCTURE
/// S: * 1 FETCH (BODYSTRUCTURE ("text" "plain" NIL NIL {2}
/// S: hi "7bit" 9 1 NIL NIL NIL NIL))
/// S: A0003 OK Fetch completed.
/// ```
///
/// Framing and command encoding are left to `imap-codec`. Untagged data is
/// not interpreted: it is kept as a list of [`types::Segment`] that mirrors
/// how it was framed on the wire, a literal splitting a response in two.
///
/// ## RFC References
///
/// IMAP4rev1 - https://datatracker.ietf.org/doc/html/rfc3501
/// Literals - https://datatracker.ietf.org/doc/html/rfc3501#section-4.3
pub mod types;

pub use client::{Client, ClientOptions};
pub use error::{Error, Result};
pub use types::*;
