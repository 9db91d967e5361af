//! Share link → outbound endpoint.

use tracing::debug;
use xr_config::defaults::default_vless_encryption;
use xr_config::enums::{EncryptionMethod, Flow, VMessSecurity};
use xr_config::outbound::{
    HttpOutboundSettings, ShadowsocksOutboundSettings, SocksOutboundSettings,
    TrojanOutboundSettings, VlessOutboundSettings, VmessOutboundSettings,
};
use xr_config::{Outbound, OutboundSettings, WireEnum};
use xr_types::{CodecError, CodecResult};

use crate::params::{decode_or, stream_from_params};
use crate::query::{non_empty, LinkParams};
use crate::scheme::LinkScheme;
use crate::uri::{decode_base64, percent_decode, LinkUri};
use crate::vmess::VmessLink;

/// Parse a share link into an outbound endpoint.
///
/// The tag is the link's display name, or `out-<scheme>-<port>` when it has none.
///
/// # Errors
/// - `UnsupportedLinkProtocol` for a scheme without a link form.
/// - `MalformedShareLink` for a structurally broken link.
pub fn decode(link: &str) -> CodecResult<Outbound> {
    let (scheme, rest) = LinkScheme::split(link.trim())?;
    let outbound = match scheme {
        LinkScheme::Vmess => vmess(rest)?,
        LinkScheme::Vless => vless(LinkUri::parse(rest)?)?,
        LinkScheme::Trojan => trojan(LinkUri::parse(rest)?)?,
        LinkScheme::Shadowsocks => shadowsocks(LinkUri::parse(rest)?)?,
        LinkScheme::Socks | LinkScheme::Http => credentials(scheme, LinkUri::parse(rest)?)?,
    };
    debug!(
        tag = outbound.tag.as_deref().unwrap_or_default(),
        scheme = %scheme,
        "decoded share link"
    );
    Ok(outbound)
}

fn default_tag(scheme: LinkScheme, port: u16) -> String {
    format!("out-{}-{port}", scheme.token())
}

fn tag_of(scheme: LinkScheme, uri: &LinkUri<'_>) -> String {
    uri.fragment
        .clone()
        .unwrap_or_else(|| default_tag(scheme, uri.port))
}

fn required_userinfo(uri: &LinkUri<'_>, what: &str) -> CodecResult<String> {
    match uri.userinfo {
        Some(raw) if !raw.is_empty() => percent_decode(raw, raw),
        _ => Err(CodecError::malformed_link(
            uri.host.as_str(),
            format!("missing {what}"),
        )),
    }
}

fn vless(uri: LinkUri<'_>) -> CodecResult<Outbound> {
    let id = required_userinfo(&uri, "user id")?;
    let params = LinkParams::from_query(uri.query)?;
    let flow = non_empty(&params.flow)
        .map(|f| decode_or(Some(f), Flow::None))
        .filter(|f| !f.is_none());
    let settings = VlessOutboundSettings {
        address: Some(uri.host.clone()),
        port: Some(uri.port),
        id: Some(id),
        encryption: Some(
            non_empty(&params.encryption)
                .map(String::from)
                .unwrap_or_else(default_vless_encryption),
        ),
        flow,
        ..VlessOutboundSettings::default()
    };
    Ok(Outbound::new(tag_of(LinkScheme::Vless, &uri), OutboundSettings::Vless(settings))
        .with_stream(stream_from_params(&params)))
}

fn vmess(payload: &str) -> CodecResult<Outbound> {
    let link = VmessLink::parse(payload)?;
    let security = link
        .scy
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| decode_or(Some(s), VMessSecurity::Auto));
    let tag = if link.ps.is_empty() {
        default_tag(LinkScheme::Vmess, link.port)
    } else {
        link.ps.clone()
    };
    let stream = stream_from_params(&link.to_params());
    let settings = VmessOutboundSettings {
        address: Some(link.add),
        port: Some(link.port),
        id: Some(link.id),
        security,
        ..VmessOutboundSettings::default()
    };
    Ok(Outbound::new(tag, OutboundSettings::Vmess(settings)).with_stream(stream))
}

fn trojan(uri: LinkUri<'_>) -> CodecResult<Outbound> {
    let password = required_userinfo(&uri, "password")?;
    let params = LinkParams::from_query(uri.query)?;
    let settings = TrojanOutboundSettings {
        address: Some(uri.host.clone()),
        port: Some(uri.port),
        password: Some(password),
        ..TrojanOutboundSettings::default()
    };
    Ok(Outbound::new(tag_of(LinkScheme::Trojan, &uri), OutboundSettings::Trojan(settings))
        .with_stream(stream_from_params(&params)))
}

/// Userinfo is `method:password`, plain or base64. For 2022 ciphers the
/// password keeps its `serverKey:userKey` form.
fn shadowsocks(uri: LinkUri<'_>) -> CodecResult<Outbound> {
    let raw = required_userinfo(&uri, "credentials")?;
    let secret = if raw.contains(':') {
        raw
    } else {
        let bytes = decode_base64(&raw).ok_or_else(|| {
            CodecError::malformed_link(raw.as_str(), "credentials are neither method:password nor base64")
        })?;
        String::from_utf8(bytes)
            .map_err(|e| CodecError::malformed_link(raw.as_str(), e.to_string()))?
    };
    let (method, password) = secret
        .split_once(':')
        .ok_or_else(|| CodecError::malformed_link(secret.as_str(), "missing method separator"))?;
    let method = Some(method).filter(|m| !m.is_empty()).and_then(|m| {
        EncryptionMethod::decode(m)
            .map_err(|err| debug!(%err, "unknown shadowsocks method"))
            .ok()
    });
    let params = LinkParams::from_query(uri.query)?;
    let settings = ShadowsocksOutboundSettings {
        address: Some(uri.host.clone()),
        port: Some(uri.port),
        method,
        password: Some(password.to_string()),
        ..ShadowsocksOutboundSettings::default()
    };
    Ok(Outbound::new(
        tag_of(LinkScheme::Shadowsocks, &uri),
        OutboundSettings::Shadowsocks(settings),
    )
    .with_stream(stream_from_params(&params)))
}

/// `user:pass`, percent-escaped or base64. A bare user name is kept as-is.
fn split_credentials(raw: &str) -> CodecResult<(String, Option<String>)> {
    if let Some((user, pass)) = raw.split_once(':') {
        return Ok((percent_decode(raw, user)?, Some(percent_decode(raw, pass)?)));
    }
    let plain = percent_decode(raw, raw)?;
    let decoded = decode_base64(&plain).and_then(|bytes| String::from_utf8(bytes).ok());
    match decoded.as_deref().and_then(|d| d.split_once(':')) {
        Some((user, pass)) => Ok((user.to_string(), Some(pass.to_string()))),
        None => Ok((plain, None)),
    }
}

fn credentials(scheme: LinkScheme, uri: LinkUri<'_>) -> CodecResult<Outbound> {
    let (user, pass) = match uri.userinfo.filter(|u| !u.is_empty()) {
        Some(raw) => {
            let (user, pass) = split_credentials(raw)?;
            (Some(user), pass)
        }
        None => (None, None),
    };
    let tag = tag_of(scheme, &uri);
    let settings = if scheme == LinkScheme::Http {
        OutboundSettings::Http(HttpOutboundSettings {
            address: uri.host,
            port: uri.port,
            user,
            pass,
            ..HttpOutboundSettings::default()
        })
    } else {
        OutboundSettings::Socks(SocksOutboundSettings {
            address: uri.host,
            port: uri.port,
            user,
            pass,
            ..SocksOutboundSettings::default()
        })
    };
    Ok(Outbound::new(tag, settings))
}
