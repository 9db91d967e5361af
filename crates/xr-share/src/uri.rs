//! `scheme://userinfo@host:port/?query#fragment` assembly and parsing.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;
use xr_types::{CodecError, CodecResult};

use crate::scheme::LinkScheme;

/// Escaped in the display-name fragment. Spaces stay literal.
const FRAGMENT: &AsciiSet = &CONTROLS.add(b'"').add(b'#').add(b'%').add(b'<').add(b'>').add(b'`');

/// Escaped in userinfo components.
const USERINFO: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

pub(crate) fn escape_userinfo(s: &str) -> Cow<'_, str> {
    utf8_percent_encode(s, USERINFO).into()
}

pub(crate) fn escape_fragment(s: &str) -> Cow<'_, str> {
    utf8_percent_encode(s, FRAGMENT).into()
}

/// Bracket bare IPv6 literals.
pub(crate) fn format_host(host: &str) -> Cow<'_, str> {
    if host.contains(':') && !host.starts_with('[') {
        Cow::Owned(format!("[{host}]"))
    } else {
        Cow::Borrowed(host)
    }
}

/// Assemble a link. `userinfo` must already be escaped.
pub(crate) fn build(
    scheme: LinkScheme,
    userinfo: &str,
    host: &str,
    port: u16,
    query: Option<&str>,
    fragment: &str,
) -> String {
    let mut link = format!("{}{userinfo}@{}:{port}", scheme.prefix(), format_host(host));
    if let Some(query) = query {
        link.push_str("/?");
        link.push_str(query);
    }
    link.push('#');
    link.push_str(&escape_fragment(fragment));
    link
}

/// Base64 in any of the common alphabets, padded or not.
pub(crate) fn decode_base64(input: &str) -> Option<Vec<u8>> {
    let input = input.trim();
    [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(input).ok())
}

pub(crate) fn percent_decode(segment: &str, value: &str) -> CodecResult<String> {
    urlencoding::decode(value)
        .map(Cow::into_owned)
        .map_err(|e| CodecError::malformed_link(segment, e.to_string()))
}

/// Components of a URI link, still escaped except for `host` and `fragment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkUri<'a> {
    pub userinfo: Option<&'a str>,
    pub host: String,
    pub port: u16,
    pub query: &'a str,
    pub fragment: Option<String>,
}

impl<'a> LinkUri<'a> {
    /// Parse what follows `scheme://`.
    pub(crate) fn parse(rest: &'a str) -> CodecResult<Self> {
        let (rest, fragment) = match rest.split_once('#') {
            Some((rest, frag)) => (rest, Some(percent_decode(frag, frag)?)),
            None => (rest, None),
        };
        let (rest, query) = rest.split_once('?').unwrap_or((rest, ""));
        let authority = rest.trim_end_matches('/');
        let (userinfo, host_port) = match authority.rsplit_once('@') {
            Some((user, hp)) => (Some(user), hp),
            None => (None, authority),
        };
        if host_port.contains('/') {
            return Err(CodecError::malformed_link(host_port, "unexpected path"));
        }
        let (host, port) = split_host_port(host_port)?;
        Ok(Self {
            userinfo,
            host,
            port,
            query,
            fragment: fragment.filter(|f| !f.is_empty()),
        })
    }
}

fn split_host_port(host_port: &str) -> CodecResult<(String, u16)> {
    let (host, port) = if let Some(v6) = host_port.strip_prefix('[') {
        let (host, tail) = v6
            .split_once(']')
            .ok_or_else(|| CodecError::malformed_link(host_port, "unterminated IPv6 literal"))?;
        let port = tail
            .strip_prefix(':')
            .ok_or_else(|| CodecError::malformed_link(host_port, "missing port"))?;
        (host, port)
    } else {
        host_port
            .rsplit_once(':')
            .ok_or_else(|| CodecError::malformed_link(host_port, "missing port"))?
    };
    if host.is_empty() {
        return Err(CodecError::malformed_link(host_port, "empty host"));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| CodecError::malformed_link(port, "invalid port"))?;
    Ok((host.to_string(), port))
}
