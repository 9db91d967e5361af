//! Mapping between `streamSettings` and link parameters.

use rand::Rng;
use tracing::debug;
use xr_config::enums::{
    Fingerprint, HeadersType, KcpHeaderType, StreamNetwork, StreamSecurity, XHttpMode,
};
use xr_config::security::{RealitySettings, TlsSettings};
use xr_config::transport::{
    GrpcSettings, HttpHeaders, HttpRequest, HttpUpgradeSettings, KcpHeader, KcpSettings,
    RawHeader, RawSettings, WsSettings, XHttpSettings,
};
use xr_config::{Security, StreamSettings, Transport, WireEnum};

use crate::defaults::GRPC_MULTI_MODE;
use crate::query::{non_empty, LinkParams};
use crate::random::{pick, spider_x};

/// Decode an optional token, falling back on absence or an unknown value.
pub(crate) fn decode_or<T: WireEnum>(token: Option<&str>, fallback: T) -> T {
    match token {
        None => fallback,
        Some(token) => T::decode(token).unwrap_or_else(|err| {
            debug!(%err, "unknown link value, using default");
            fallback
        }),
    }
}

/// `type` and the parameters of the active transport.
pub(crate) fn transport_params(stream: &StreamSettings, params: &mut LinkParams) {
    params.r#type = Some(stream.network().token().to_string());
    match &stream.transport {
        Transport::Raw(raw) => {
            if let Some(header) = raw.http_header() {
                params.path = header.request_path().map(String::from);
                params.host = Some(header.request_host().unwrap_or_default().to_string());
                params.header_type = Some(HeadersType::Http.token().to_string());
            }
        }
        Transport::Kcp(kcp) => {
            params.header_type = Some(kcp.header_type().token().to_string());
            params.seed = kcp.seed.clone();
        }
        Transport::Ws(ws) => {
            params.path = ws.path.clone();
            params.host = Some(ws.effective_host().unwrap_or_default().to_string());
        }
        Transport::Grpc(grpc) => {
            params.service_name = grpc.service_name.clone();
            params.authority = grpc.authority.clone();
            if grpc.multi_mode {
                params.mode = Some(GRPC_MULTI_MODE.to_string());
            }
        }
        Transport::HttpUpgrade(upgrade) => {
            params.path = upgrade.path.clone();
            params.host = Some(upgrade.effective_host().unwrap_or_default().to_string());
        }
        Transport::XHttp(xhttp) => {
            params.path = xhttp.path.clone();
            params.host = Some(xhttp.effective_host().unwrap_or_default().to_string());
            params.mode = Some(xhttp.mode.token().to_string());
        }
    }
}

/// Parameters of the active security layer; `security` itself is left to the caller.
pub(crate) fn security_params<R: Rng + ?Sized>(
    security: &Security,
    params: &mut LinkParams,
    rng: &mut R,
) {
    match security {
        Security::None => {}
        Security::Tls(tls) => tls_params(tls, params),
        Security::Reality(reality) => reality_params(reality, params, rng),
    }
}

fn tls_params(tls: &TlsSettings, params: &mut LinkParams) {
    if !tls.alpn().is_empty() {
        params.alpn = Some(tls.alpn().join(","));
    }
    params.sni = tls.server_name().map(String::from);
    params.ech = tls.ech_config_list.clone().filter(|e| !e.is_empty());
    params.fp = tls.fingerprint().map(|fp| fp.token().to_string());
    if tls.allow_insecure {
        params.allow_insecure = Some("1".to_string());
    }
}

// Draw order is sni, sid, spx.
fn reality_params<R: Rng + ?Sized>(reality: &RealitySettings, params: &mut LinkParams, rng: &mut R) {
    params.sni = pick(rng, &reality.server_names).map(String::from);
    params.pbk = reality.password.clone().filter(|p| !p.is_empty());
    params.sid = pick(rng, &reality.short_ids).map(String::from);
    params.pqv = reality.mldsa65_verify.clone().filter(|v| !v.is_empty());
    if !reality.fingerprint.is_none() {
        params.fp = Some(reality.fingerprint.token().to_string());
    }
    params.spx = Some(spider_x(rng));
}

/// Rebuild `streamSettings` from link parameters. Absent discriminators mean
/// raw transport and no security.
pub(crate) fn stream_from_params(params: &LinkParams) -> StreamSettings {
    let network = decode_or(non_empty(&params.r#type), StreamNetwork::Raw);
    let path = non_empty(&params.path).map(String::from);
    let host = non_empty(&params.host).map(String::from);

    let transport = match network {
        StreamNetwork::Raw => {
            let header = match decode_or(non_empty(&params.header_type), HeadersType::None) {
                HeadersType::None => None,
                HeadersType::Http => Some(RawHeader {
                    r#type: HeadersType::Http,
                    request: Some(HttpRequest {
                        path: path.map(|p| vec![p]),
                        headers: host.map(|h| HttpHeaders::from_iter([("Host", h)])),
                        ..HttpRequest::default()
                    }),
                    response: None,
                }),
            };
            Transport::Raw(RawSettings {
                header,
                ..RawSettings::default()
            })
        }
        StreamNetwork::Kcp => Transport::Kcp(KcpSettings {
            header: non_empty(&params.header_type).map(|t| KcpHeader {
                r#type: decode_or(Some(t), KcpHeaderType::None),
                domain: None,
            }),
            seed: non_empty(&params.seed).map(String::from).or(path),
            ..KcpSettings::default()
        }),
        StreamNetwork::Ws => Transport::Ws(WsSettings {
            path,
            host,
            ..WsSettings::default()
        }),
        StreamNetwork::Grpc => Transport::Grpc(GrpcSettings {
            service_name: params.service_name.clone(),
            authority: non_empty(&params.authority).map(String::from),
            multi_mode: params.mode.as_deref() == Some(GRPC_MULTI_MODE),
            ..GrpcSettings::default()
        }),
        StreamNetwork::HttpUpgrade => Transport::HttpUpgrade(HttpUpgradeSettings {
            path,
            host,
            ..HttpUpgradeSettings::default()
        }),
        StreamNetwork::XHttp => Transport::XHttp(XHttpSettings {
            path,
            host,
            mode: decode_or(non_empty(&params.mode), XHttpMode::Auto),
            ..XHttpSettings::default()
        }),
    };

    let security = match decode_or(non_empty(&params.security), StreamSecurity::None) {
        StreamSecurity::None => Security::None,
        StreamSecurity::Tls => Security::Tls(TlsSettings {
            server_name: non_empty(&params.sni).map(String::from),
            ech_config_list: non_empty(&params.ech).map(String::from),
            alpn: non_empty(&params.alpn).map(|alpn| {
                alpn.split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(String::from)
                    .collect()
            }),
            allow_insecure: matches!(params.allow_insecure.as_deref(), Some("1" | "true")),
            fingerprint: Some(decode_or(non_empty(&params.fp), Fingerprint::None))
                .filter(|fp| !fp.is_none()),
            ..TlsSettings::default()
        }),
        StreamSecurity::Reality => Security::Reality(RealitySettings {
            server_name: non_empty(&params.sni).map(String::from),
            fingerprint: decode_or(non_empty(&params.fp), Fingerprint::Chrome),
            password: non_empty(&params.pbk).map(String::from),
            short_id: params.sid.clone(),
            spider_x: non_empty(&params.spx).map(String::from),
            mldsa65_verify: non_empty(&params.pqv).map(String::from),
            ..RealitySettings::default()
        }),
    };

    StreamSettings::new(transport, security)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params_of(stream: &StreamSettings) -> LinkParams {
        let mut params = LinkParams::default();
        transport_params(stream, &mut params);
        security_params(&stream.security, &mut params, &mut StdRng::seed_from_u64(1));
        params
    }

    #[test]
    fn raw_without_header_only_sets_type() {
        let params = params_of(&StreamSettings::default());
        assert_eq!(params.to_query(), "type=raw");
    }

    #[test]
    fn grpc_multi_mode() {
        let stream = StreamSettings::new(
            Transport::Grpc(GrpcSettings {
                service_name: Some("svc".into()),
                authority: Some("grpc.example".into()),
                multi_mode: true,
                ..GrpcSettings::default()
            }),
            Security::None,
        );
        let params = params_of(&stream);
        assert_eq!(
            params.to_query(),
            "type=grpc&serviceName=svc&authority=grpc.example&mode=multi"
        );
        assert_eq!(stream_from_params(&params).transport, stream.transport);
    }

    #[test]
    fn kcp_emits_header_type_even_when_unset() {
        let stream = StreamSettings::new(
            Transport::Kcp(KcpSettings {
                seed: Some("s33d".into()),
                ..KcpSettings::default()
            }),
            Security::None,
        );
        assert_eq!(params_of(&stream).to_query(), "type=kcp&headerType=none&seed=s33d");
    }

    #[test]
    fn kcp_seed_falls_back_to_path() {
        let params = LinkParams::from_query("type=mkcp&headerType=wechat-video&path=legacy").unwrap();
        match stream_from_params(&params).transport {
            Transport::Kcp(kcp) => {
                assert_eq!(kcp.seed.as_deref(), Some("legacy"));
                assert_eq!(kcp.header_type(), KcpHeaderType::WechatVideo);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ws_host_falls_back_to_header() {
        let stream = StreamSettings::new(
            Transport::Ws(WsSettings {
                path: Some("/ws".into()),
                headers: Some(HttpHeaders::from_iter([("host", "cdn.example".to_string())])),
                ..WsSettings::default()
            }),
            Security::None,
        );
        assert_eq!(params_of(&stream).to_query(), "type=ws&path=/ws&host=cdn.example");
    }

    #[test]
    fn xhttp_always_carries_host_and_mode() {
        let stream = StreamSettings::new(Transport::XHttp(XHttpSettings::default()), Security::None);
        assert_eq!(params_of(&stream).to_query(), "type=xhttp&host=&mode=auto");
    }

    #[test]
    fn unknown_values_fall_back_to_defaults() {
        let params = LinkParams::from_query("type=carrier-pigeon&security=rot13").unwrap();
        let stream = stream_from_params(&params);
        assert_eq!(stream.network(), StreamNetwork::Raw);
        assert_eq!(stream.security_kind(), StreamSecurity::None);
    }

    #[test]
    fn tls_params_decode() {
        let params = LinkParams::from_query(
            "type=ws&security=tls&alpn=h2,http/1.1&sni=a.com&fp=firefox&allowInsecure=1&ech=AEX",
        )
        .unwrap();
        let stream = stream_from_params(&params);
        let tls = stream.security.tls().unwrap();
        assert_eq!(tls.alpn(), ["h2".to_string(), "http/1.1".to_string()]);
        assert_eq!(tls.server_name(), Some("a.com"));
        assert_eq!(tls.fingerprint(), Some(Fingerprint::Firefox));
        assert!(tls.allow_insecure);
        assert_eq!(tls.ech_config_list.as_deref(), Some("AEX"));
    }

    #[test]
    fn reality_fingerprint_defaults_to_chrome() {
        let params = LinkParams::from_query("security=reality&pbk=key&sid=ab&spx=/x").unwrap();
        let stream = stream_from_params(&params);
        let reality = stream.security.reality().unwrap();
        assert_eq!(reality.fingerprint, Fingerprint::Chrome);
        assert_eq!(reality.password.as_deref(), Some("key"));
        assert_eq!(reality.short_id.as_deref(), Some("ab"));
        assert_eq!(reality.spider_x.as_deref(), Some("/x"));
    }
}
