use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use aero_imap_client::Transport;

/// Everything needed to reach one server and label what it answered.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerProfile {
    pub id: String,
    pub transport: Transport,
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Scratch mailbox, deleted and recreated at each run
    pub mailbox: String,
    /// Inserted between the message stem and the artifact extension
    pub suffix: String,
}

/// On-disk replacement for the built-in registry
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProfileFile {
    #[serde(rename = "profile", default)]
    pub profiles: Vec<ServerProfile>,
}

/// Command line values taking precedence over every selected profile
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub mailbox: Option<String>,
    pub transport: Option<Transport>,
}

impl Overrides {
    pub fn apply(&self, mut profile: ServerProfile) -> ServerProfile {
        if let Some(host) = &self.host {
            profile.host = host.clone();
        }
        if let Some(port) = self.port {
            profile.port = port;
        }
        if let Some(user) = &self.user {
            profile.user = user.clone();
        }
        if let Some(password) = &self.password {
            profile.password = password.clone();
        }
        if let Some(mailbox) = &self.mailbox {
            profile.mailbox = mailbox.clone();
        }
        if let Some(transport) = self.transport {
            profile.transport = transport;
        }
        profile
    }
}

pub fn read_config<T: DeserializeOwned>(config_file: PathBuf) -> Result<T> {
    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .open(config_file.as_path())?;

    let mut config = String::new();
    file.read_to_string(&mut config)?;

    Ok(toml::from_str(&config)?)
}

fn default_host() -> String {
    "localhost".into()
}
