//! Outbound transport: TCP, optionally bound to a local address, optionally
//! wrapped in TLS.
//!
//! Sessions only see a [`BoxedStream`], so tests can hand them an in-memory
//! pipe through their own [`Connector`].

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpSocket, TcpStream, lookup_host};
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    self, ClientConfig as TlsConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// A bidirectional byte stream a session can run over.
pub trait Stream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Stream for T {}

pub type BoxedStream = Box<dyn Stream>;

/// Opens the byte stream for a session.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ClientConfig) -> Result<BoxedStream, ClientError>;
}

/// Connects over TCP, with TLS when the configuration asks for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, config: &ClientConfig) -> Result<BoxedStream, ClientError> {
        let stream = connect_tcp(&config.server, config.port, config.local_address).await?;
        if let Err(e) = enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }

        if !config.tls {
            return Ok(Box::new(stream));
        }

        let tls = tls_config(!config.tls_insecure);
        let connector = TlsConnector::from(Arc::new(tls));
        let server_name = ServerName::try_from(config.server.clone())
            .map_err(|e| ClientError::Tls(e.to_string()))?;
        let stream = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| ClientError::Tls(e.to_string()))?;
        debug!(server = %config.server, "TLS handshake complete");
        Ok(Box::new(stream))
    }
}

/// Try each resolved address in turn. With a local address, only addresses
/// of the same family are tried.
async fn connect_tcp(
    host: &str,
    port: u16,
    local: Option<IpAddr>,
) -> Result<TcpStream, ClientError> {
    let mut last_error = None;

    for addr in lookup_host((host, port)).await? {
        let attempt = match local {
            Some(local) if local.is_ipv4() != addr.is_ipv4() => continue,
            Some(local) => connect_from(SocketAddr::new(local, 0), addr).await,
            None => TcpStream::connect(addr).await,
        };
        match attempt {
            Ok(stream) => {
                debug!(%addr, "connected");
                return Ok(stream);
            }
            Err(e) => {
                debug!(%addr, error = %e, "connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("no usable address for {}:{}", host, port),
            )
        })
        .into())
}

async fn connect_from(local: SocketAddr, remote: SocketAddr) -> std::io::Result<TcpStream> {
    let socket = if remote.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.bind(local)?;
    socket.connect(remote).await
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));
    sock.set_tcp_keepalive(&keepalive)
}

/// Client TLS settings: the system roots, or no verification at all.
pub fn tls_config(verify_cert: bool) -> TlsConfig {
    if !verify_cert {
        return TlsConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier))
            .with_no_client_auth();
    }

    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for cert in certs.certs {
        if let Err(e) = roots.add(cert) {
            warn!("Failed to add root cert: {}", e);
        }
    }
    for e in &certs.errors {
        warn!("Error loading native certs: {}", e);
    }

    TlsConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth()
}

/// Accepts any server certificate. Only used with `tls_insecure`.
#[derive(Debug)]
struct NoVerifier;

impl ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_plain_tcp_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"PING :x\r\n").await.unwrap();
        });

        let mut config = ClientConfig::new("127.0.0.1", "alice");
        config.port = port;
        config.local_address = Some("127.0.0.1".parse().unwrap());

        let mut stream = TcpConnector.connect(&config).await.unwrap();
        let mut buf = [0u8; 9];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"PING :x\r\n");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused_is_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = ClientConfig::new("127.0.0.1", "alice");
        config.port = port;
        let err = TcpConnector.connect(&config).await.err().unwrap();
        assert!(matches!(err, ClientError::Io(_)));
    }

    #[tokio::test]
    async fn test_local_address_family_mismatch() {
        let mut config = ClientConfig::new("127.0.0.1", "alice");
        config.port = 6667;
        config.local_address = Some("::1".parse().unwrap());
        let err = TcpConnector.connect(&config).await.err().unwrap();
        assert!(matches!(err, ClientError::Io(ref e) if e.kind() == std::io::ErrorKind::AddrNotAvailable));
    }

    #[test]
    fn test_insecure_tls_config_builds() {
        let config = tls_config(false);
        assert!(config.alpn_protocols.is_empty());
    }
}
