//! SOCKS5 handshake: method negotiation (RFC 1928), username/password
//! sub-negotiation (RFC 1929) and request parsing.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use twinproxy_auth::AuthMethod;
use twinproxy_core::TargetAddr;

use crate::error::{Socks5Error, SocksError};

pub const SOCKS5_VERSION: u8 = 0x05;
pub const METHOD_NO_AUTH: u8 = 0x00;
pub const METHOD_USER_PASSWORD: u8 = 0x02;
pub const METHOD_NO_ACCEPTABLE: u8 = 0xFF;

/// RFC 1929 sub-negotiation version.
pub const AUTH_VERSION: u8 = 0x01;
pub const AUTH_SUCCESS: u8 = 0x00;
pub const AUTH_FAILURE: u8 = 0x01;

pub const CMD_CONNECT: u8 = 0x01;
pub const CMD_BIND: u8 = 0x02;
pub const CMD_UDP_ASSOCIATE: u8 = 0x03;

pub const ATYP_IPV4: u8 = 0x01;
pub const ATYP_DOMAIN: u8 = 0x03;
pub const ATYP_IPV6: u8 = 0x04;

/// SOCKS5 reply codes.
pub const REPLY_SUCCEEDED: u8 = 0x00;
pub const REPLY_GENERAL_FAILURE: u8 = 0x01;
pub const REPLY_CONNECTION_NOT_ALLOWED: u8 = 0x02;
pub const REPLY_NETWORK_UNREACHABLE: u8 = 0x03;
pub const REPLY_HOST_UNREACHABLE: u8 = 0x04;
pub const REPLY_CONNECTION_REFUSED: u8 = 0x05;
pub const REPLY_TTL_EXPIRED: u8 = 0x06;
pub const REPLY_COMMAND_NOT_SUPPORTED: u8 = 0x07;
pub const REPLY_ADDRESS_TYPE_NOT_SUPPORTED: u8 = 0x08;

/// Parsed SOCKS5 request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Socks5Request {
    pub command: u8,
    pub target: TargetAddr,
}

/// Credentials from the RFC 1929 sub-negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPassword {
    pub username: String,
    pub password: String,
}

async fn read_exact<S>(stream: &mut S, buf: &mut [u8]) -> Result<(), SocksError>
where
    S: AsyncRead + Unpin,
{
    match stream.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(Socks5Error::Truncated.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Perform SOCKS5 method negotiation (server side).
///
/// Selects the single method `required` demands. When the client did not
/// offer it, answers `0xFF` and fails.
pub async fn negotiate_method<S>(stream: &mut S, required: AuthMethod) -> Result<u8, SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut header = [0u8; 2];
    read_exact(stream, &mut header).await?;
    if header[0] != SOCKS5_VERSION {
        return Err(Socks5Error::InvalidVersion(header[0]).into());
    }

    let mut methods = vec![0u8; header[1] as usize];
    read_exact(stream, &mut methods).await?;

    let wanted = match required {
        AuthMethod::NoAuth => METHOD_NO_AUTH,
        AuthMethod::UserPassword => METHOD_USER_PASSWORD,
    };

    if methods.contains(&wanted) {
        stream.write_all(&[SOCKS5_VERSION, wanted]).await?;
        Ok(wanted)
    } else {
        let _ = stream
            .write_all(&[SOCKS5_VERSION, METHOD_NO_ACCEPTABLE])
            .await;
        Err(Socks5Error::NoAcceptableMethods.into())
    }
}

/// Read the RFC 1929 username/password request.
///
/// Non UTF-8 bytes are replaced, so such names can never match a stored
/// entry.
pub async fn read_credentials<S>(stream: &mut S) -> Result<UserPassword, SocksError>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    read_exact(stream, &mut header).await?;
    if header[0] != AUTH_VERSION {
        return Err(Socks5Error::InvalidAuthVersion(header[0]).into());
    }

    let mut username = vec![0u8; header[1] as usize];
    read_exact(stream, &mut username).await?;

    let mut plen = [0u8; 1];
    read_exact(stream, &mut plen).await?;
    let mut password = vec![0u8; plen[0] as usize];
    read_exact(stream, &mut password).await?;

    Ok(UserPassword {
        username: String::from_utf8_lossy(&username).into_owned(),
        password: String::from_utf8_lossy(&password).into_owned(),
    })
}

/// Send the RFC 1929 status reply.
pub async fn send_auth_status<S>(stream: &mut S, success: bool) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let status = if success { AUTH_SUCCESS } else { AUTH_FAILURE };
    stream.write_all(&[AUTH_VERSION, status]).await?;
    stream.flush().await
}

/// Read the SOCKS5 request after method negotiation.
///
/// The whole request is consumed before returning, including for commands
/// the caller will refuse.
pub async fn read_request<S>(stream: &mut S) -> Result<Socks5Request, SocksError>
where
    S: AsyncRead + Unpin,
{
    // VER CMD RSV ATYP
    let mut header = [0u8; 4];
    read_exact(stream, &mut header).await?;
    if header[0] != SOCKS5_VERSION {
        return Err(Socks5Error::InvalidVersion(header[0]).into());
    }

    let command = header[1];
    let target = read_address(stream, header[3]).await?;
    Ok(Socks5Request { command, target })
}

async fn read_address<S>(stream: &mut S, atyp: u8) -> Result<TargetAddr, SocksError>
where
    S: AsyncRead + Unpin,
{
    match atyp {
        ATYP_IPV4 => {
            let mut buf = [0u8; 6]; // 4 addr + 2 port
            read_exact(stream, &mut buf).await?;
            let ip = Ipv4Addr::new(buf[0], buf[1], buf[2], buf[3]);
            let port = u16::from_be_bytes([buf[4], buf[5]]);
            Ok(TargetAddr::Ip(SocketAddr::from((ip, port))))
        }
        ATYP_DOMAIN => {
            let mut len = [0u8; 1];
            read_exact(stream, &mut len).await?;
            let len = len[0] as usize;
            let mut buf = vec![0u8; len + 2]; // domain + port
            read_exact(stream, &mut buf).await?;
            let port = u16::from_be_bytes([buf[len], buf[len + 1]]);
            let domain = std::str::from_utf8(&buf[..len])
                .map_err(|_| Socks5Error::InvalidDomain)?;
            if domain.is_empty() {
                return Err(Socks5Error::InvalidDomain.into());
            }
            Ok(TargetAddr::from_host_port(domain, port))
        }
        ATYP_IPV6 => {
            let mut buf = [0u8; 18]; // 16 addr + 2 port
            read_exact(stream, &mut buf).await?;
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&buf[..16]);
            let port = u16::from_be_bytes([buf[16], buf[17]]);
            Ok(TargetAddr::Ip(SocketAddr::from((Ipv6Addr::from(octets), port))))
        }
        _ => Err(Socks5Error::UnsupportedAddressType(atyp).into()),
    }
}

/// Send a SOCKS5 reply.
pub async fn send_reply<S>(stream: &mut S, reply: u8, bind_addr: &SocketAddr) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(22);
    buf.push(SOCKS5_VERSION);
    buf.push(reply);
    buf.push(0x00); // RSV

    match bind_addr {
        SocketAddr::V4(addr) => {
            buf.push(ATYP_IPV4);
            buf.extend_from_slice(&addr.ip().octets());
            buf.extend_from_slice(&addr.port().to_be_bytes());
        }
        SocketAddr::V6(addr) => {
            buf.push(ATYP_IPV6);
            buf.extend_from_slice(&addr.ip().octets());
            buf.extend_from_slice(&addr.port().to_be_bytes());
        }
    }

    stream.write_all(&buf).await?;
    stream.flush().await
}

/// Send a SOCKS5 reply with a zeroed bind address (0.0.0.0:0).
pub async fn send_reply_unspecified<S>(stream: &mut S, reply: u8) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], 0u16));
    send_reply(stream, reply, &addr).await
}
