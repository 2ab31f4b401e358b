use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pemfile::certs;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::error::{Error, Result};
use crate::types::Transport;

pub trait Stream: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> Stream for T {}

pub type AnyStream = Box<dyn Stream>;

pub async fn open(
    transport: Transport,
    host: &str,
    port: u16,
    ca_file: Option<&Path>,
) -> Result<AnyStream> {
    let tcp = TcpStream::connect((host, port)).await?;
    tracing::debug!(host, port, %transport, "TCP connection established");

    match transport {
        Transport::Plain => Ok(Box::new(tcp)),
        Transport::Tls => {
            let connector = TlsConnector::from(Arc::new(tls_config(ca_file)?));
            let server_name = ServerName::try_from(host)
                .map_err(|_| Error::InvalidDnsName(host.to_string()))?
                .to_owned();
            let tls = connector.connect(server_name, tcp).await?;
            tracing::debug!(host, port, "TLS handshake done");
            Ok(Box::new(tls))
        }
    }
}

fn tls_config(ca_file: Option<&Path>) -> Result<ClientConfig> {
    let config = match ca_file {
        Some(path) => {
            let mut roots = RootCertStore::empty();
            for cert in certs(&mut std::io::BufReader::new(std::fs::File::open(path)?)) {
                roots.add(cert?)?;
            }
            ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth()
        }
        None => {
            tracing::warn!("no CA bundle configured, server certificates are NOT verified");
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCert::new()))
                .with_no_client_auth()
        }
    };
    Ok(config)
}

/// Test beds run with self-signed certificates: only the handshake signatures
/// are checked, not the chain of trust.
#[derive(Debug)]
struct AcceptAnyCert(WebPkiSupportedAlgorithms);

impl AcceptAnyCert {
    fn new() -> Self {
        Self(rustls::crypto::ring::default_provider().signature_verification_algorithms)
    }
}

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.supported_schemes()
    }
}
