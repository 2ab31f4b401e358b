use std::path::PathBuf;
use std::time::Duration;

use aero_imap_client::{Client, ClientOptions, Error, Response};
use async_trait::async_trait;

use crate::config::ServerProfile;

/// The IMAP commands the harness issues.
///
/// `Ok` carries the tagged completion whatever its status: a `NO` is a
/// normal answer. `Err` means the connection can not be trusted anymore.
#[async_trait]
pub trait ImapBackend: Send {
    async fn login(&mut self, user: &str, password: &str) -> Result<Response, Error>;
    async fn select(&mut self, mailbox: &str) -> Result<Response, Error>;
    async fn create(&mut self, mailbox: &str) -> Result<Response, Error>;
    async fn delete(&mut self, mailbox: &str) -> Result<Response, Error>;
    async fn append(&mut self, mailbox: &str, message: &[u8]) -> Result<Response, Error>;
    async fn fetch(&mut self, sequence_set: &str, items: &str) -> Result<Response, Error>;
    async fn close(&mut self) -> Result<Response, Error>;
    async fn logout(&mut self) -> Result<Response, Error>;
}

#[async_trait]
impl ImapBackend for Client {
    async fn login(&mut self, user: &str, password: &str) -> Result<Response, Error> {
        Client::login(self, user, password).await
    }
    async fn select(&mut self, mailbox: &str) -> Result<Response, Error> {
        Client::select(self, mailbox).await
    }
    async fn create(&mut self, mailbox: &str) -> Result<Response, Error> {
        Client::create(self, mailbox).await
    }
    async fn delete(&mut self, mailbox: &str) -> Result<Response, Error> {
        Client::delete(self, mailbox).await
    }
    async fn append(&mut self, mailbox: &str, message: &[u8]) -> Result<Response, Error> {
        Client::append(self, mailbox, message).await
    }
    async fn fetch(&mut self, sequence_set: &str, items: &str) -> Result<Response, Error> {
        Client::fetch(self, sequence_set, items).await
    }
    async fn close(&mut self) -> Result<Response, Error> {
        Client::close(self).await
    }
    async fn logout(&mut self) -> Result<Response, Error> {
        Client::logout(self).await
    }
}

/// Opens one backend per profile run.
#[async_trait]
pub trait Connector: Sync {
    type Backend: ImapBackend;
    async fn connect(&self, profile: &ServerProfile) -> Result<Self::Backend, Error>;
}

/// Reaches real servers over TCP, with TLS when the profile asks for it.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    pub ca_file: Option<PathBuf>,
    pub timeout: Duration,
}

#[async_trait]
impl Connector for TcpConnector {
    type Backend = Client;

    async fn connect(&self, profile: &ServerProfile) -> Result<Client, Error> {
        let opts = ClientOptions {
            transport: profile.transport,
            host: profile.host.clone(),
            port: profile.port,
            ca_file: self.ca_file.clone(),
            timeout: self.timeout,
        };
        Client::connect(&opts).await
    }
}
