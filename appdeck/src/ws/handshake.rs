//! HTTP Upgrade handshake over TLS

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::errors::AppsError;

/// Fixed path of the app log multiplexer
pub const LOG_STREAM_PATH: &str = "/logz/stream";

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Open a TLS connection to `{host}:443` and perform the WebSocket
/// upgrade at `path`.
///
/// On success the returned socket is positioned immediately after the
/// 101 response; any bytes already read past the header terminator are
/// returned alongside it for the frame codec to drain first.
pub async fn connect(
    host: &str,
    path: &str,
    authorization: &str,
    origin: &str,
    connect_timeout: Duration,
) -> Result<(TlsStream<TcpStream>, Vec<u8>), AppsError> {
    debug!("Opening WebSocket to {}{}", host, path);

    let tcp = tokio::time::timeout(connect_timeout, TcpStream::connect((host, 443)))
        .await
        .map_err(|_| {
            AppsError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("connect to {}:443 timed out", host),
            ))
        })??;

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| AppsError::Config(format!("Invalid host name: {}", host)))?;
    let mut tls = TlsConnector::from(tls_config()?)
        .connect(server_name, tcp)
        .await?;

    let mut nonce = [0u8; 16];
    OsRng.fill_bytes(&mut nonce);
    let key = BASE64.encode(nonce);

    let request = format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Authorization: {authorization}\r\n\
         Origin: {origin}\r\n\
         \r\n"
    );
    tls.write_all(request.as_bytes()).await?;

    // Read until the header terminator; the server may send frame
    // bytes in the same segment as the response headers.
    let mut response: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = find_terminator(&response) {
            break pos;
        }
        let n = tls.read(&mut chunk).await?;
        if n == 0 {
            return Err(upgrade_failed(&response));
        }
        response.extend_from_slice(&chunk[..n]);
    };

    let header = &response[..header_end];
    let status_line = header
        .split(|&b| b == b'\n')
        .next()
        .map(|line| String::from_utf8_lossy(line).trim_end().to_string())
        .unwrap_or_default();
    if !status_line.contains(" 101 ") {
        return Err(AppsError::HandshakeFailed {
            status: status_line,
            body: String::from_utf8_lossy(&response[header_end + HEADER_TERMINATOR.len()..])
                .into_owned(),
        });
    }

    let leftover = response[header_end + HEADER_TERMINATOR.len()..].to_vec();
    Ok((tls, leftover))
}

fn find_terminator(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

fn upgrade_failed(response: &[u8]) -> AppsError {
    let text = String::from_utf8_lossy(response);
    let mut lines = text.splitn(2, '\n');
    AppsError::HandshakeFailed {
        status: lines.next().unwrap_or_default().trim_end().to_string(),
        body: lines.next().unwrap_or_default().to_string(),
    }
}

fn tls_config() -> Result<Arc<ClientConfig>, AppsError> {
    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs()
        .map_err(|e| AppsError::Config(format!("Failed to load system root certs: {e}")))?;
    roots.add_parsable_certificates(certs);

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}
