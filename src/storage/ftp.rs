//! FTP sessions over suppaftp

use super::remote::{ConnectionSettings, RemoteSession};
use super::{EntryInfo, EntryKind};
use crate::error::{Error, Result};
use crate::utils::helpers::join_path;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use suppaftp::list::File as ListedFile;
use suppaftp::types::FileType;
use suppaftp::{FtpError, Mode, NativeTlsConnector, NativeTlsFtpStream, Status};

pub struct FtpSession {
    stream: NativeTlsFtpStream,
    host: String,
}

fn connection_error(host: &str, err: impl std::fmt::Display) -> Error {
    Error::connection(format!("{}: {}", host, err))
}

/// Map a transfer failure onto the crate taxonomy
fn transfer_error(path: &str, err: FtpError) -> Error {
    match err {
        FtpError::ConnectionError(source) => Error::connection(format!("{}: {}", path, source)),
        FtpError::UnexpectedResponse(response) if response.status == Status::FileUnavailable => {
            Error::not_found(path)
        }
        other => Error::io(path, io::Error::new(io::ErrorKind::Other, other.to_string())),
    }
}

fn resolve(settings: &ConnectionSettings) -> Result<SocketAddr> {
    (settings.host.as_str(), settings.port)
        .to_socket_addrs()
        .map_err(|e| connection_error(&settings.host, e))?
        .next()
        .ok_or_else(|| connection_error(&settings.host, "host did not resolve"))
}

impl FtpSession {
    /// Connect, optionally upgrade to explicit TLS, log in and switch to binary mode
    pub fn open(settings: &ConnectionSettings) -> Result<Self> {
        let host = settings.host.clone();
        let addr = resolve(settings)?;
        let mut stream = NativeTlsFtpStream::connect_timeout(addr, settings.timeout())
            .map_err(|e| connection_error(&host, e))?;

        if settings.use_tls {
            let connector = native_tls::TlsConnector::new().map_err(|e| connection_error(&host, e))?;
            stream = stream
                .into_secure(NativeTlsConnector::from(connector), &host)
                .map_err(|e| connection_error(&host, e))?;
        }

        stream
            .get_ref()
            .set_read_timeout(Some(settings.timeout()))
            .map_err(|e| connection_error(&host, e))?;
        stream
            .login(&settings.username, &settings.password)
            .map_err(|e| connection_error(&host, e))?;
        stream.set_mode(if settings.passive { Mode::Passive } else { Mode::Active });
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| connection_error(&host, e))?;

        tracing::debug!(host = %host, tls = settings.use_tls, passive = settings.passive, "ftp login ok");
        Ok(Self { stream, host })
    }
}

/// Parse one `LIST` line; unparseable lines are skipped
fn parse_list_line(directory: &str, line: &str) -> Option<EntryInfo> {
    let listed: ListedFile = line.parse().ok()?;
    let name = listed.name().to_string();
    let kind = if listed.is_directory() {
        EntryKind::Dir
    } else if listed.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    };
    let permissions = line
        .split_whitespace()
        .next()
        .filter(|token| token.len() == 10 && token.chars().skip(1).all(|c| "rwxsStT-".contains(c)))
        .unwrap_or_default()
        .to_string();
    Some(EntryInfo {
        full_path: join_path(&[directory, &name]),
        name,
        kind,
        size: listed.size() as u64,
        modified: Some(listed.modified()),
        permissions,
    })
}

impl RemoteSession for FtpSession {
    fn list(&mut self, path: &str) -> Result<Vec<EntryInfo>> {
        let lines = self
            .stream
            .list(Some(path))
            .map_err(|e| transfer_error(path, e))?;
        Ok(lines
            .iter()
            .filter_map(|line| parse_list_line(path, line))
            .collect())
    }

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>> {
        let buffer = self
            .stream
            .retr_as_buffer(path)
            .map_err(|e| transfer_error(path, e))?;
        Ok(buffer.into_inner())
    }

    fn close(&mut self) {
        if let Err(err) = self.stream.quit() {
            tracing::debug!(host = %self.host, "ftp quit failed: {}", err);
        }
    }
}
