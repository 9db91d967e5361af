//! Stable contract checks for xr-types errors and port payloads

use xr_types::ports::{NewUser, UserCredential, UserTraffic};
use xr_types::{CodecError, ErrorClass};

#[test]
fn every_variant_has_a_class() {
    let cases = vec![
        (CodecError::unknown_enum_token("StreamNetwork", "quic"), ErrorClass::Enum),
        (CodecError::invalid_port("bad-range-x", "not a number"), ErrorClass::Port),
        (CodecError::unsupported_protocol("quantum-tunnel"), ErrorClass::Dispatch),
        (CodecError::client_not_found("a@b", "in"), ErrorClass::Lookup),
        (CodecError::duplicate_client("a@b", "in"), ErrorClass::Lookup),
        (CodecError::unsupported_link("wireguard"), ErrorClass::Link),
        (CodecError::malformed_link("vmess://", "bad base64"), ErrorClass::Link),
        (CodecError::malformed_document("inbounds[0]", "missing field"), ErrorClass::Document),
    ];
    for (err, class) in cases {
        assert_eq!(err.class(), class, "{err}");
    }
}

#[test]
fn errors_serialize_with_variant_names() {
    let err = CodecError::unsupported_protocol("quantum-tunnel");
    let v = serde_json::to_value(&err).unwrap();
    assert_eq!(v["UnsupportedProtocol"]["tag"], "quantum-tunnel");

    let back: CodecError = serde_json::from_value(v).unwrap();
    assert_eq!(back, err);
}

#[test]
fn user_credential_is_kind_tagged() {
    let user = NewUser {
        tag: "vless-in".into(),
        email: "example@test.com".into(),
        level: 0,
        credential: UserCredential::Vless {
            id: "26a28e07-8509-45b4-844a-6d881593d7de".into(),
            flow: "xtls-rprx-vision".into(),
        },
    };
    let v = serde_json::to_value(&user).unwrap();
    assert_eq!(v["credential"]["kind"], "vless");
    assert_eq!(v["credential"]["flow"], "xtls-rprx-vision");

    let traffic = UserTraffic {
        email: "example@test.com".into(),
        uplink: 10,
        downlink: 20,
    };
    let v = serde_json::to_value(&traffic).unwrap();
    assert_eq!(v["downlink"], 20);
}
