//! Connection specification grammar.
//!
//! Endpoints are described on the command line as `type:detail1:detail2`:
//!
//! | type       | detail1    | detail2  |
//! |------------|------------|----------|
//! | `ipclient` | host       | port     |
//! | `ipserver` | host       | port     |
//! | `serial`   | port name  | baudrate |
//!
//! Sniff endpoints prefix the same grammar with the primary connection whose
//! traffic they mirror: `N:type:detail1:detail2` with `N` in `{1, 2}`.
//!
//! Parsing is pure; nothing here touches a socket or a serial device.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Transport family named by the `type` field of a specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    IpClient,
    IpServer,
    Serial,
}

impl ConnectionKind {
    /// All recognised kinds, in the order they are listed in usage text.
    pub const ALL: [Self; 3] = [Self::IpClient, Self::IpServer, Self::Serial];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IpClient => "ipclient",
            Self::IpServer => "ipserver",
            Self::Serial => "serial",
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::Spec(format!("invalid connection type \"{s}\"")))
    }
}

/// A fully parsed endpoint specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSpec {
    /// Outbound TCP connection to `host:port`.
    IpClient { host: String, port: u16 },
    /// TCP listener on `host:port` serving a single peer at a time.
    IpServer { host: String, port: u16 },
    /// Serial device opened at `baud_rate`.
    Serial { port_name: String, baud_rate: u32 },
}

impl ConnectionSpec {
    pub const fn kind(&self) -> ConnectionKind {
        match self {
            Self::IpClient { .. } => ConnectionKind::IpClient,
            Self::IpServer { .. } => ConnectionKind::IpServer,
            Self::Serial { .. } => ConnectionKind::Serial,
        }
    }
}

impl fmt::Display for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IpClient { host, port } | Self::IpServer { host, port } => {
                write!(f, "{}:{host}:{port}", self.kind())
            }
            Self::Serial {
                port_name,
                baud_rate,
            } => write!(f, "{}:{port_name}:{baud_rate}", self.kind()),
        }
    }
}

impl FromStr for ConnectionSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, details) = s
            .split_once(':')
            .ok_or_else(|| Error::Spec(format!("\"{s}\" is missing connection details")))?;
        let kind: ConnectionKind = kind.parse()?;

        // Split on the last colon so IPv6 hosts like `::1` keep their colons.
        let (first, second) = details.rsplit_once(':').ok_or_else(|| {
            Error::Spec(format!(
                "\"{s}\" must have the form {kind}:{}",
                detail_names(kind)
            ))
        })?;
        if first.is_empty() {
            return Err(Error::Spec(format!("\"{s}\" has an empty {}", kind_target(kind))));
        }

        match kind {
            ConnectionKind::IpClient | ConnectionKind::IpServer => {
                let host = first.to_string();
                let port = parse_number::<u16>(second, "port", s)?;
                Ok(if kind == ConnectionKind::IpClient {
                    Self::IpClient { host, port }
                } else {
                    Self::IpServer { host, port }
                })
            }
            ConnectionKind::Serial => Ok(Self::Serial {
                port_name: first.to_string(),
                baud_rate: parse_number::<u32>(second, "baudrate", s)?,
            }),
        }
    }
}

const fn detail_names(kind: ConnectionKind) -> &'static str {
    match kind {
        ConnectionKind::IpClient | ConnectionKind::IpServer => "host:port",
        ConnectionKind::Serial => "portname:baudrate",
    }
}

const fn kind_target(kind: ConnectionKind) -> &'static str {
    match kind {
        ConnectionKind::IpClient | ConnectionKind::IpServer => "host",
        ConnectionKind::Serial => "port name",
    }
}

fn parse_number<T: FromStr>(value: &str, field: &str, spec: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Spec(format!("\"{spec}\" has an invalid {field} \"{value}\"")))
}

/// Which primary connection a sniff endpoint mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SniffTarget {
    /// Mirrors the bytes received on connection 1.
    First,
    /// Mirrors the bytes received on connection 2.
    Second,
}

impl SniffTarget {
    pub const fn index(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

impl fmt::Display for SniffTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// A sniff endpoint specification: `N:type:detail1:detail2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffSpec {
    pub target: SniffTarget,
    pub connection: ConnectionSpec,
}

impl fmt::Display for SniffSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.target, self.connection)
    }
}

impl FromStr for SniffSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (target, rest) = s
            .split_once(':')
            .ok_or_else(|| Error::Spec(format!("\"{s}\" must have the form N:type:details")))?;
        let target = match target {
            "1" => SniffTarget::First,
            "2" => SniffTarget::Second,
            other => {
                return Err(Error::Spec(format!(
                    "sniff connection must be 1 or 2, got \"{other}\""
                )));
            }
        };
        Ok(Self {
            target,
            connection: rest.parse()?,
        })
    }
}
