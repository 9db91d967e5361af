//! Document codec behaviour over whole configuration documents.

use serde_json::{json, Value};
use std::fs;
use xr_config::enums::{InboundProtocol, OutboundProtocol, StreamNetwork, StreamSecurity};
use xr_config::{load_path, Config, Inbound, Outbound, WireEnum};
use xr_types::{CodecError, ErrorClass};

fn rich_document() -> Value {
    json!({
        "routing": {
            "domainStrategy": "IPIfNonMatch",
            "rules": [
                {"type": "field", "inboundTag": ["api"], "outboundTag": "api"},
                {"type": "field", "ip": ["geoip:private"], "network": "tcp,udp", "outboundTag": "block"}
            ]
        },
        "log": {"loglevel": "warning", "access": "none"},
        "futureSection": {"enabled": true},
        "inbounds": [
            {
                "tag": "vless-reality",
                "port": 443,
                "protocol": "vless",
                "settings": {
                    "clients": [{"id": "11111111-2222-3333-4444-555555555555", "email": "a@x", "flow": "xtls-rprx-vision"}],
                    "decryption": "none"
                },
                "streamSettings": {
                    "network": "tcp",
                    "security": "reality",
                    "realitySettings": {
                        "dest": "www.example.com:443",
                        "serverNames": ["www.example.com"],
                        "privateKey": "priv",
                        "shortIds": ["", "0123abcd"]
                    }
                },
                "sniffing": {"enabled": true, "destOverride": ["http", "tls", "quic"]}
            },
            {
                "listen": "127.0.0.1",
                "tag": "ws-tls",
                "port": "20000-20010",
                "protocol": "vmess",
                "settings": {"clients": [{"id": "u", "email": "b@x"}]},
                "streamSettings": {
                    "network": "websocket",
                    "security": "tls",
                    "wsSettings": {"path": "/ws", "headers": {"Host": "cdn.example"}},
                    "grpcSettings": {"serviceName": "ignored"},
                    "tlsSettings": {"serverName": "cdn.example", "alpn": ["h2", "http/1.1"], "fingerprint": "chrome"}
                }
            },
            {
                "tag": "ss",
                "port": "env:SS_PORT",
                "protocol": "shadowsocks",
                "settings": {
                    "method": "2022-blake3-aes-128-gcm",
                    "password": "server-key",
                    "clients": [{"password": "user-key", "email": "c@x"}],
                    "network": "tcp,udp"
                }
            }
        ],
        "outbounds": [
            {"protocol": "direct", "tag": "direct", "settings": {"domainStrategy": "UseIPv4"}},
            {"protocol": "blackhole", "tag": "block", "settings": {"response": {"type": "http"}}},
            {
                "protocol": "vless",
                "tag": "proxy",
                "settings": {"vnext": [{"address": "a.example", "port": 443, "users": [{"id": "u", "encryption": "none", "flow": "xtls-rprx-vision"}]}]},
                "streamSettings": {
                    "network": "xhttp",
                    "security": "tls",
                    "xhttpSettings": {"path": "/up", "mode": "packet-up"},
                    "sockopt": {"mark": 255, "tcpFastOpen": true}
                },
                "mux": {"enabled": false, "concurrency": -1}
            }
        ],
        "dns": {"servers": ["1.1.1.1", {"address": "8.8.8.8", "domains": ["geosite:google"]}]},
        "policy": {"levels": {"0": {"handshake": 4, "connIdle": 300}}}
    })
}

#[test]
fn every_inbound_protocol_dispatches_to_its_variant() {
    for protocol in InboundProtocol::values() {
        let settings = match protocol {
            InboundProtocol::Wireguard => json!({"secretKey": "k"}),
            _ => json!({}),
        };
        let node = json!({"tag": "t", "port": 1000, "protocol": protocol.token(), "settings": settings});
        let inbound = Inbound::from_value(node)
            .unwrap_or_else(|e| panic!("{protocol:?} failed to decode: {e}"));
        assert_eq!(inbound.protocol(), protocol);
        assert_eq!(inbound.settings.protocol(), protocol);
    }
}

#[test]
fn every_outbound_protocol_dispatches_to_its_variant() {
    for protocol in OutboundProtocol::values() {
        let settings = match protocol {
            OutboundProtocol::Loopback => json!({"inboundTag": "in"}),
            OutboundProtocol::Http | OutboundProtocol::Socks | OutboundProtocol::Hysteria => {
                json!({"address": "1.2.3.4", "port": 1080})
            }
            OutboundProtocol::Wireguard => json!({"secretKey": "k"}),
            _ => json!({}),
        };
        let node = json!({"tag": "t", "protocol": protocol.token(), "settings": settings});
        let outbound = Outbound::from_value(node)
            .unwrap_or_else(|e| panic!("{protocol:?} failed to decode: {e}"));
        assert_eq!(outbound.protocol(), protocol);
    }
}

#[test]
fn unregistered_protocol_fails_the_whole_document() {
    let doc = json!({
        "inbounds": [
            {"tag": "ok", "port": 1, "protocol": "socks"},
            {"tag": "bad", "port": 2, "protocol": "quantum-tunnel"}
        ]
    });
    let err = Config::from_value(doc).unwrap_err();
    assert_eq!(err, CodecError::unsupported_protocol("quantum-tunnel"));
    assert_eq!(err.class(), ErrorClass::Dispatch);
}

#[test]
fn unregistered_outbound_protocol_is_unsupported() {
    let err = Outbound::from_value(json!({"protocol": "quantum-tunnel"})).unwrap_err();
    assert_eq!(err, CodecError::unsupported_protocol("quantum-tunnel"));
}

#[test]
fn inbound_without_tag_is_rejected_at_its_path() {
    let doc = json!({
        "inbounds": [
            {"tag": "ok", "port": 1, "protocol": "socks"},
            {"port": 2, "protocol": "socks"}
        ]
    });
    let err = Config::from_value(doc).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Document);
    assert!(
        matches!(err, CodecError::MalformedDocument { ref path, .. } if path == "inbounds[1].tag"),
        "{err:?}"
    );

    let err = Inbound::from_value(json!({"tag": 7, "port": 1, "protocol": "http"})).unwrap_err();
    assert!(matches!(err, CodecError::MalformedDocument { ref path, .. } if path == "tag"));
}

#[test]
fn nested_stream_errors_keep_their_kind_and_path() {
    let doc = json!({
        "outbounds": [{
            "protocol": "freedom",
            "streamSettings": {"network": "quic"}
        }]
    });
    assert_eq!(
        Config::from_value(doc).unwrap_err(),
        CodecError::unknown_enum_token("StreamNetwork", "quic")
    );

    let doc = json!({
        "inbounds": [{
            "tag": "in",
            "port": 443,
            "protocol": "socks",
            "streamSettings": {"security": "tls", "tlsSettings": {"fingerprint": 12}}
        }]
    });
    let err = Config::from_value(doc).unwrap_err();
    assert!(
        matches!(err, CodecError::MalformedDocument { ref path, .. }
            if path == "inbounds[0].streamSettings.tlsSettings"),
        "{err:?}"
    );

    let err = Config::from_value(json!({"transport": {"security": "ssl"}})).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Enum);
}

#[test]
fn lenient_decode_skips_broken_endpoints() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
    let doc = json!({
        "inbounds": [
            {"tag": "ok", "port": 1, "protocol": "socks"},
            {"tag": "bad", "port": 2, "protocol": "quantum-tunnel"},
            {"tag": "bad-port", "port": "9-1", "protocol": "http"}
        ],
        "outbounds": [{"protocol": "freedom"}]
    });
    let (cfg, skipped) = Config::from_value_lenient(doc).unwrap();
    assert_eq!(cfg.inbounds.len(), 1);
    assert_eq!(cfg.inbounds[0].tag, "ok");
    assert_eq!(cfg.outbounds.len(), 1);
    assert_eq!(skipped.len(), 2);
    assert_eq!(skipped[0].class(), ErrorClass::Dispatch);
    assert_eq!(skipped[1].class(), ErrorClass::Port);
}

#[test]
fn rich_document_decodes() {
    let cfg = Config::from_value(rich_document()).unwrap();
    assert_eq!(cfg.inbounds.len(), 3);
    assert_eq!(cfg.outbounds.len(), 3);

    let reality = cfg.inbound("vless-reality").unwrap();
    assert_eq!(reality.stream().network(), StreamNetwork::Raw);
    assert_eq!(reality.stream().security_kind(), StreamSecurity::Reality);
    let r = reality.stream().security.reality().unwrap();
    assert_eq!(r.short_ids, vec!["".to_string(), "0123abcd".to_string()]);

    let ws = cfg.inbound("ws-tls").unwrap();
    assert_eq!(ws.stream().network(), StreamNetwork::Ws);
    assert_eq!(ws.port.to_string(), "20000-20010");

    assert_eq!(cfg.outbound("direct").unwrap().protocol(), OutboundProtocol::Freedom);
}

#[test]
fn encoding_is_idempotent() {
    let first = Config::from_value(rich_document()).unwrap().to_json_string().unwrap();
    let second = Config::from_json_str(&first).unwrap().to_json_string().unwrap();
    assert_eq!(first, second);

    let pretty = Config::from_json_str(&first).unwrap().to_json_string_pretty().unwrap();
    let third = Config::from_json_str(&pretty).unwrap().to_json_string().unwrap();
    assert_eq!(first, third);
}

#[test]
fn encoding_uses_canonical_tokens_and_fixed_order() {
    let text = Config::from_value(rich_document()).unwrap().to_json_string().unwrap();
    let v: Value = serde_json::from_str(&text).unwrap();

    let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["log", "dns", "routing", "policy", "inbounds", "outbounds"]);

    let stream = &v["inbounds"][0]["streamSettings"];
    assert_eq!(stream["network"], "raw");
    assert_eq!(stream["realitySettings"]["target"], "www.example.com:443");
    assert!(stream["realitySettings"].get("dest").is_none());

    let ws = &v["inbounds"][1]["streamSettings"];
    assert_eq!(ws["network"], "ws");
    assert!(ws.get("grpcSettings").is_none());

    assert_eq!(v["inbounds"][2]["port"], "env:SS_PORT");
    assert_eq!(v["outbounds"][0]["protocol"], "freedom");
    assert_eq!(v["outbounds"][2]["streamSettings"]["xhttpSettings"]["mode"], "packet-up");
    assert!(v.get("futureSection").is_none());
}

#[test]
fn decode_is_order_independent() {
    let forward = json!({
        "inbounds": [{"tag": "a", "port": 1, "protocol": "http", "settings": {"accounts": [{"user": "u", "pass": "p"}]}}],
        "log": {"loglevel": "debug"}
    });
    let backward = json!({
        "log": {"loglevel": "debug"},
        "inbounds": [{"settings": {"accounts": [{"pass": "p", "user": "u"}]}, "protocol": "http", "port": 1, "tag": "a"}]
    });
    assert_eq!(
        Config::from_value(forward).unwrap(),
        Config::from_value(backward).unwrap()
    );
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_documents_decode_like_json() {
    let yaml = r#"
inbounds:
  - tag: socks-in
    port: "1080"
    protocol: socks
    settings:
      auth: noauth
      udp: true
outbounds:
  - protocol: freedom
    tag: direct
"#;
    let cfg = Config::from_yaml_str(yaml).unwrap();
    assert_eq!(cfg.inbounds[0].port, xr_config::Port::Single(1080));
    assert_eq!(cfg.outbounds[0].tag.as_deref(), Some("direct"));
}

#[test]
fn load_path_picks_the_format_by_extension() {
    let dir = tempfile::tempdir().unwrap();

    let json_path = dir.path().join("config.json");
    fs::write(&json_path, serde_json::to_string(&rich_document()).unwrap()).unwrap();
    let cfg = load_path(&json_path).unwrap();
    assert_eq!(cfg.inbounds.len(), 3);

    #[cfg(feature = "yaml")]
    {
        let yaml_path = dir.path().join("config.yml");
        fs::write(&yaml_path, "outbounds:\n  - protocol: blackhole\n").unwrap();
        let cfg = load_path(&yaml_path).unwrap();
        assert_eq!(cfg.outbounds[0].protocol(), OutboundProtocol::Blackhole);
    }

    let toml_path = dir.path().join("config.toml");
    fs::write(&toml_path, "x = 1").unwrap();
    let err = load_path(&toml_path).unwrap_err();
    assert!(err.to_string().contains("unsupported config extension"));

    let missing = dir.path().join("absent.json");
    assert!(load_path(&missing).is_err());
}

#[test]
fn load_path_keeps_the_codec_error_as_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"inbounds":[{"tag":"x","port":1,"protocol":"quantum-tunnel"}]}"#).unwrap();
    let err = load_path(&path).unwrap_err();
    let codec = err.downcast_ref::<CodecError>().unwrap();
    assert_eq!(codec, &CodecError::unsupported_protocol("quantum-tunnel"));
}
