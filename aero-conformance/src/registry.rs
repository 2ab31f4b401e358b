use std::collections::HashSet;

use thiserror::Error;

use crate::config::{ServerProfile, Transport};

/// Selects every registered profile
pub const ALL: &str = "all";

/// Random enough to never collide with a mailbox someone cares about
pub const SCRATCH_MAILBOX: &str = "kzUXL7HyS5OjLcU8";

struct Entry {
    id: &'static str,
    transport: Transport,
    port: u16,
    user: &'static str,
    password: &'static str,
    mailbox_prefix: &'static str,
    suffix: &'static str,
}

// The servers of the docker-compose test bed, all listening on localhost.
const BUILTIN: &[Entry] = &[
    Entry {
        id: "dovecot",
        transport: Transport::Tls,
        port: 993,
        user: "test",
        password: "pass",
        mailbox_prefix: "",
        suffix: ".dovecot",
    },
    Entry {
        id: "maddy",
        transport: Transport::Tls,
        port: 994,
        user: "test@example.com",
        password: "pass",
        mailbox_prefix: "",
        suffix: ".maddy",
    },
    Entry {
        id: "cyrus",
        transport: Transport::Plain,
        port: 143,
        user: "test",
        password: "pass",
        // cyrus only accepts mailboxes under the user's INBOX
        mailbox_prefix: "INBOX.",
        suffix: ".cyrus",
    },
    Entry {
        id: "courier",
        transport: Transport::Plain,
        port: 144,
        user: "debian",
        password: "debian",
        mailbox_prefix: "",
        suffix: ".courier",
    },
    Entry {
        id: "stalwart",
        transport: Transport::Tls,
        port: 1993,
        user: "test@example.com",
        password: "pass",
        mailbox_prefix: "",
        suffix: ".stalwart.0.2.0",
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no server profile is registered")]
    Empty,
    #[error("a server profile has an empty identifier")]
    EmptyId,
    #[error("`{}` is reserved to select every profile", ALL)]
    Reserved,
    #[error("server profile `{0}` is registered twice")]
    Duplicate(String),
    #[error("unknown server profile `{target}`, expected `{}` or one of: {known}", ALL)]
    UnknownProfile { target: String, known: String },
}

/// Immutable table of the servers we know how to reach.
#[derive(Debug, Clone)]
pub struct Registry {
    profiles: Vec<ServerProfile>,
}

impl Registry {
    pub fn new(profiles: Vec<ServerProfile>) -> Result<Self, RegistryError> {
        if profiles.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for profile in profiles.iter() {
            if profile.id.is_empty() {
                return Err(RegistryError::EmptyId);
            }
            if profile.id == ALL {
                return Err(RegistryError::Reserved);
            }
            if !seen.insert(profile.id.as_str()) {
                return Err(RegistryError::Duplicate(profile.id.clone()));
            }
        }

        Ok(Self { profiles })
    }

    /// The profiles the recorded artifacts were produced with, validated like
    /// any other table.
    pub fn builtin() -> Result<Self, RegistryError> {
        let profiles = BUILTIN
            .iter()
            .map(|e| ServerProfile {
                id: e.id.to_string(),
                transport: e.transport,
                host: "localhost".to_string(),
                port: e.port,
                user: e.user.to_string(),
                password: e.password.to_string(),
                mailbox: format!("{}{}", e.mailbox_prefix, SCRATCH_MAILBOX),
                suffix: e.suffix.to_string(),
            })
            .collect();

        Self::new(profiles)
    }

    pub fn get(&self, id: &str) -> Option<&ServerProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn profiles(&self) -> &[ServerProfile] {
        &self.profiles
    }

    /// `all` expands to every profile in registration order, anything else
    /// must name exactly one profile.
    pub fn select(&self, target: &str) -> Result<Vec<ServerProfile>, RegistryError> {
        if target == ALL {
            return Ok(self.profiles.clone());
        }

        match self.get(target) {
            Some(profile) => Ok(vec![profile.clone()]),
            None => Err(RegistryError::UnknownProfile {
                target: target.to_string(),
                known: self
                    .profiles
                    .iter()
                    .map(|p| p.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}
