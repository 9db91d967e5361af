//! Inbound endpoint + one of its clients → share link.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::Rng;
use tracing::debug;
use xr_config::defaults::DEFAULT_LISTEN_ADDR;
use xr_config::enums::StreamNetwork;
use xr_config::inbound::{
    HttpAccount, ShadowsocksClient, ShadowsocksInboundSettings, SocksAccount, TrojanClient,
    VlessClient, VlessInboundSettings, VmessClient,
};
use xr_config::{ClientRef, Inbound, InboundSettings, Security, StreamSettings, WireEnum};
use xr_types::{CodecError, CodecResult};

use crate::params::{security_params, transport_params};
use crate::query::LinkParams;
use crate::scheme::LinkScheme;
use crate::uri::{build, escape_userinfo};
use crate::vmess::VmessLink;

/// Where the link points and what it is called.
struct Target<'a> {
    host: &'a str,
    port: u16,
    remark: &'a str,
    stream: &'a StreamSettings,
}

/// Share link for the client identified by `key` (email, or user name for
/// SOCKS/HTTP accounts).
///
/// # Errors
/// See [`encode_with_rng`].
pub fn encode(inbound: &Inbound, key: &str) -> CodecResult<String> {
    encode_with_rng(inbound, key, &mut rand::thread_rng())
}

/// [`encode`] with an explicit random source for the REALITY fields.
///
/// # Errors
/// - `UnsupportedLinkProtocol` when the protocol has no link form.
/// - `ClientNotFound`/`DuplicateClient` when `key` does not select exactly one client.
/// - `InvalidPortFormat` when the inbound port is a range or an env reference.
pub fn encode_with_rng<R: Rng + ?Sized>(
    inbound: &Inbound,
    key: &str,
    rng: &mut R,
) -> CodecResult<String> {
    let scheme = LinkScheme::for_inbound(inbound.protocol())?;
    let client = inbound.find_client(key)?;
    let port = inbound.port.single().ok_or_else(|| {
        CodecError::invalid_port(inbound.port.to_string(), "share links need a literal port")
    })?;
    let target = Target {
        host: inbound
            .listen
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LISTEN_ADDR),
        port,
        remark: if inbound.tag.is_empty() {
            inbound.protocol().token()
        } else {
            &inbound.tag
        },
        stream: inbound.stream(),
    };
    debug!(tag = %inbound.tag, scheme = %scheme, key, "encoding share link");

    match (&inbound.settings, client) {
        (InboundSettings::Vless(settings), ClientRef::Vless(client)) => {
            Ok(vless(&target, settings, client, rng))
        }
        (InboundSettings::Vmess(_), ClientRef::Vmess(client)) => vmess(&target, client),
        (InboundSettings::Trojan(_), ClientRef::Trojan(client)) => Ok(trojan(&target, client, rng)),
        (InboundSettings::Shadowsocks(settings), ClientRef::Shadowsocks(client)) => {
            Ok(shadowsocks(&target, settings, client, rng))
        }
        (InboundSettings::Socks(_), ClientRef::Socks(SocksAccount { user, pass }))
        | (InboundSettings::Http(_), ClientRef::Http(HttpAccount { user, pass })) => {
            Ok(credentials(scheme, &target, user, pass))
        }
        _ => Err(CodecError::unsupported_link(inbound.protocol().token())),
    }
}

/// One link per client, in client order.
///
/// # Errors
/// See [`encode_with_rng`]; the first failure stops the run.
pub fn encode_all(inbound: &Inbound) -> CodecResult<Vec<String>> {
    LinkScheme::for_inbound(inbound.protocol())?;
    let mut rng = rand::thread_rng();
    inbound
        .client_keys()
        .into_iter()
        .map(|key| encode_with_rng(inbound, key, &mut rng))
        .collect()
}

fn vless<R: Rng + ?Sized>(
    target: &Target<'_>,
    settings: &VlessInboundSettings,
    client: &VlessClient,
    rng: &mut R,
) -> String {
    let stream = target.stream;
    let mut params = LinkParams {
        encryption: Some(settings.decryption.token().to_string()),
        security: Some(stream.security_kind().token().to_string()),
        ..LinkParams::default()
    };
    // Flow is tied to raw transport only; it is written for any security,
    // including `none`.
    if stream.network() == StreamNetwork::Raw && !client.flow.is_none() {
        params.flow = Some(client.flow.token().to_string());
    }
    transport_params(stream, &mut params);
    security_params(&stream.security, &mut params, rng);
    build(
        LinkScheme::Vless,
        &escape_userinfo(&client.id),
        target.host,
        target.port,
        Some(&params.to_query()),
        target.remark,
    )
}

fn vmess(target: &Target<'_>, client: &VmessClient) -> CodecResult<String> {
    VmessLink::new(target.host, target.port, &client.id, target.remark, target.stream).to_link()
}

fn trojan<R: Rng + ?Sized>(target: &Target<'_>, client: &TrojanClient, rng: &mut R) -> String {
    let stream = target.stream;
    let mut params = LinkParams {
        security: Some(stream.security_kind().token().to_string()),
        ..LinkParams::default()
    };
    transport_params(stream, &mut params);
    security_params(&stream.security, &mut params, rng);
    build(
        LinkScheme::Trojan,
        &escape_userinfo(&client.password),
        target.host,
        target.port,
        Some(&params.to_query()),
        target.remark,
    )
}

/// Userinfo is base64 of `method:password`, or `method:serverKey:userKey` for
/// 2022 ciphers. The query carries no `security` key, only TLS parameters.
fn shadowsocks<R: Rng + ?Sized>(
    target: &Target<'_>,
    settings: &ShadowsocksInboundSettings,
    client: &ShadowsocksClient,
    rng: &mut R,
) -> String {
    let method = client.method.or(settings.method);
    let token = method.map(|m| m.token()).unwrap_or_default();
    let secret = match method {
        Some(m) if m.is_2022() => format!(
            "{token}:{}:{}",
            settings.password.as_deref().unwrap_or_default(),
            client.password
        ),
        _ => format!("{token}:{}", client.password),
    };

    let stream = target.stream;
    let mut params = LinkParams::default();
    transport_params(stream, &mut params);
    if let Security::Tls(_) = &stream.security {
        security_params(&stream.security, &mut params, rng);
    }
    build(
        LinkScheme::Shadowsocks,
        &escape_userinfo(&STANDARD.encode(secret)),
        target.host,
        target.port,
        Some(&params.to_query()),
        target.remark,
    )
}

fn credentials(scheme: LinkScheme, target: &Target<'_>, user: &str, pass: &str) -> String {
    let userinfo = format!("{}:{}", escape_userinfo(user), escape_userinfo(pass));
    build(scheme, &userinfo, target.host, target.port, None, target.remark)
}
