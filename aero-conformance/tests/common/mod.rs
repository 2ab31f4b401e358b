#![allow(dead_code)]
pub mod constants;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use aero_conformance::config::{ServerProfile, Transport};
use constants::SCRATCH;

#[derive(Default)]
pub struct FakeState {
    pub mailboxes: HashMap<String, Vec<Vec<u8>>>,
    pub connections: usize,
}

/// A tiny IMAP server answering just what the harness asks, on a random
/// local port. BODYSTRUCTURE answers carry the subject in a literal.
pub struct FakeServer {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeServer {
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(FakeState::default()));

        let shared = state.clone();
        tokio::spawn(async move {
            loop {
                let (socket, _) = match listener.accept().await {
                    Ok(v) => v,
                    Err(e) => {
                        println!("fake server accept failed: {}", e);
                        return;
                    }
                };
                if let Ok(mut state) = shared.lock() {
                    state.connections += 1;
                }
                let conn_state = shared.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve(socket, conn_state).await {
                        println!("fake server connection failed: {:#}", e);
                    }
                });
            }
        });

        Ok(Self { addr, state })
    }

    pub fn profile(&self) -> ServerProfile {
        ServerProfile {
            id: "fake".into(),
            transport: Transport::Plain,
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            user: "test".into(),
            password: "pass".into(),
            mailbox: SCRATCH.into(),
            suffix: ".fake".into(),
        }
    }

    pub fn connections(&self) -> usize {
        self.state.lock().map(|s| s.connections).unwrap_or(0)
    }

    pub fn stored(&self, mailbox: &str) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.mailboxes.get(mailbox).map(|m| m.len()))
            .unwrap_or(0)
    }
}

pub fn write_corpus(dir: &Path, messages: &[(&str, &[u8])]) -> Result<Vec<PathBuf>> {
    let mut paths = vec![];
    for (name, content) in messages {
        let path = dir.join(name);
        std::fs::write(&path, content)?;
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

async fn serve(socket: TcpStream, state: Arc<Mutex<FakeState>>) -> Result<()> {
    let (rd, mut wr) = socket.into_split();
    let mut rd = BufReader::new(rd);
    let mut selected: Option<String> = None;

    wr.write_all(b"* OK [CAPABILITY IMAP4rev1] fake server ready\r\n")
        .await?;

    loop {
        let mut line = Vec::new();
        if rd.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&line).trim_end().to_string();
        let mut parts = text.split(' ');
        let tag = parts.next().unwrap_or("*").to_string();
        let command = parts.next().unwrap_or("").to_ascii_uppercase();
        let args = parts
            .map(|a| a.trim_matches('"').to_string())
            .collect::<Vec<_>>();
        let first = args.first().cloned().unwrap_or_default();

        let answer = match command.as_str() {
            "LOGIN" => format!("{} OK LOGIN completed\r\n", tag),
            "DELETE" => {
                let removed = lock(&state)?.mailboxes.remove(&first).is_some();
                match removed {
                    true => format!("{} OK DELETE completed\r\n", tag),
                    false => format!("{} NO [NONEXISTENT] mailbox does not exist\r\n", tag),
                }
            }
            "CREATE" => {
                let mut state = lock(&state)?;
                match state.mailboxes.contains_key(&first) {
                    true => format!("{} NO [ALREADYEXISTS] mailbox exists\r\n", tag),
                    false => {
                        state.mailboxes.insert(first.clone(), vec![]);
                        format!("{} OK CREATE completed\r\n", tag)
                    }
                }
            }
            "SELECT" => {
                let count = lock(&state)?.mailboxes.get(&first).map(|m| m.len());
                match count {
                    Some(n) => {
                        selected = Some(first.clone());
                        format!(
                            "* {} EXISTS\r\n* FLAGS (\\Seen \\Deleted)\r\n{} OK [READ-WRITE] SELECT completed\r\n",
                            n, tag
                        )
                    }
                    None => format!("{} NO mailbox does not exist\r\n", tag),
                }
            }
            "APPEND" => {
                let len = args
                    .last()
                    .and_then(|a| a.strip_prefix('{'))
                    .and_then(|a| a.strip_suffix('}'))
                    .and_then(|a| a.parse::<usize>().ok())
                    .context("APPEND without a literal")?;
                wr.write_all(b"+ Ready for literal data\r\n").await?;
                let mut message = vec![0u8; len];
                rd.read_exact(&mut message).await?;
                let mut end = Vec::new();
                rd.read_until(b'\n', &mut end).await?;

                if String::from_utf8_lossy(&message).contains("REJECT-ME") {
                    format!("{} NO [LIMIT] message refused\r\n", tag)
                } else if store(&state, &first, message)? {
                    format!("{} OK APPEND completed\r\n", tag)
                } else {
                    format!("{} NO [TRYCREATE] mailbox does not exist\r\n", tag)
                }
            }
            "FETCH" => {
                let message = {
                    let state = lock(&state)?;
                    let seq = first
                        .split(':')
                        .next()
                        .and_then(|s| s.parse::<usize>().ok())
                        .unwrap_or(0);
                    let found = selected
                        .as_ref()
                        .and_then(|m| state.mailboxes.get(m))
                        .and_then(|m| m.get(seq.wrapping_sub(1)))
                        .map(|m| (seq, m.clone()));
                    found
                };
                // a lone item may come without its parentheses
                let items = args
                    .get(1)
                    .map(|s| s.trim_start_matches('(').trim_end_matches(')'));
                match (message, items) {
                    (Some((seq, msg)), Some("BODY")) => format!(
                        "* {} FETCH (BODY (\"text\" \"plain\" (\"charset\" \"us-ascii\") NIL NIL \"7bit\" {} {}))\r\n{} OK FETCH completed\r\n",
                        seq,
                        msg.len(),
                        count_lines(&msg),
                        tag
                    ),
                    (Some((seq, msg)), Some("BODYSTRUCTURE")) => {
                        let subject = subject(&msg);
                        format!(
                            "* {} FETCH (BODYSTRUCTURE (\"text\" \"plain\" (\"charset\" \"us-ascii\") NIL {{{}}}\r\n{} \"7bit\" {} {} NIL NIL NIL NIL))\r\n{} OK FETCH completed\r\n",
                            seq,
                            subject.len(),
                            subject,
                            msg.len(),
                            count_lines(&msg),
                            tag
                        )
                    }
                    (Some(_), _) => format!("{} BAD unsupported fetch items\r\n", tag),
                    (None, _) => format!("{} OK FETCH completed\r\n", tag),
                }
            }
            "CLOSE" => {
                selected = None;
                format!("{} OK CLOSE completed\r\n", tag)
            }
            "LOGOUT" => {
                let bye = format!("* BYE fake server logging out\r\n{} OK LOGOUT completed\r\n", tag);
                wr.write_all(bye.as_bytes()).await?;
                return Ok(());
            }
            _ => format!("{} BAD unknown command\r\n", tag),
        };

        wr.write_all(answer.as_bytes()).await?;
    }
}

fn lock(state: &Arc<Mutex<FakeState>>) -> Result<std::sync::MutexGuard<'_, FakeState>> {
    match state.lock() {
        Ok(guard) => Ok(guard),
        Err(_) => bail!("fake server state poisoned"),
    }
}

fn store(state: &Arc<Mutex<FakeState>>, mailbox: &str, message: Vec<u8>) -> Result<bool> {
    let mut state = lock(state)?;
    match state.mailboxes.get_mut(mailbox) {
        Some(mbx) => {
            mbx.push(message);
            Ok(true)
        }
        None => Ok(false),
    }
}

fn subject(message: &[u8]) -> String {
    String::from_utf8_lossy(message)
        .lines()
        .find_map(|l| l.strip_prefix("Subject: ").map(|s| s.to_string()))
        .unwrap_or_default()
}

fn count_lines(message: &[u8]) -> usize {
    message.split(|b| *b == b'\n').count()
}
