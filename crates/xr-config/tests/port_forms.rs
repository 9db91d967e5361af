use proptest::prelude::*;
use serde_json::json;
use serial_test::serial;
use xr_config::Port;
use xr_types::{CodecError, ErrorClass};

#[test]
fn textual_forms_decode_to_their_variant() {
    assert_eq!(Port::parse("8080").unwrap(), Port::Single(8080));
    assert_eq!(
        Port::parse("8000-9000").unwrap(),
        Port::Range { from: 8000, to: 9000 }
    );
    assert_eq!(Port::parse("env:PORT").unwrap(), Port::Env("PORT".into()));
    let err = Port::parse("bad-range-x").unwrap_err();
    assert_eq!(err.class(), ErrorClass::Port);
    assert!(matches!(err, CodecError::InvalidPortFormat { input, .. } if input == "bad-range-x"));
}

#[test]
fn rejects_reversed_and_zero_ranges() {
    for raw in ["9000-8000", "0-10", "10-0", "-", "1-2-3", "65536", "env:", "env:A B", "+80"] {
        assert!(Port::parse(raw).is_err(), "{raw:?} should be rejected");
    }
}

#[test]
fn non_ascii_text_is_rejected_not_split() {
    for raw in ["aéé", "éééé", "env\u{e9}X", "端口", "８０"] {
        let err = Port::parse(raw).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Port, "{raw:?}");
    }
    let doc = json!({"inbounds": [{"tag": "t", "port": "aéé", "protocol": "socks"}]});
    let err = xr_config::Config::from_value(doc).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Port);
}

#[test]
fn number_and_string_nodes_both_decode() {
    assert_eq!(Port::from_json(&json!(443)).unwrap(), Port::Single(443));
    assert_eq!(Port::from_json(&json!("443")).unwrap(), Port::Single(443));
    assert_eq!(
        Port::from_json(&json!("1000-2000")).unwrap(),
        Port::Range { from: 1000, to: 2000 }
    );
    assert!(Port::from_json(&json!(-1)).is_err());
    assert!(Port::from_json(&json!(70000)).is_err());
    assert!(Port::from_json(&json!(null)).is_err());
    assert!(Port::from_json(&json!([80])).is_err());
}

#[test]
#[serial]
fn env_reference_resolves_from_process_environment() {
    std::env::set_var("XR_TEST_INBOUND_PORT", "10086");
    let port = Port::parse("env:XR_TEST_INBOUND_PORT").unwrap();
    assert_eq!(port.resolve().unwrap(), Port::Single(10086));

    std::env::set_var("XR_TEST_INBOUND_PORT", "20000-20010");
    assert_eq!(
        port.resolve().unwrap(),
        Port::Range { from: 20000, to: 20010 }
    );
    std::env::remove_var("XR_TEST_INBOUND_PORT");
}

#[test]
#[serial]
fn unset_env_reference_is_an_error() {
    std::env::remove_var("XR_TEST_MISSING_PORT");
    let err = Port::Env("XR_TEST_MISSING_PORT".into()).resolve().unwrap_err();
    assert_eq!(err.class(), ErrorClass::Port);
    // literal ports pass through untouched
    assert_eq!(Port::Single(1).resolve().unwrap(), Port::Single(1));
}

proptest! {
    #[test]
    fn single_port_text_is_normalized(p in any::<u16>(), zeros in 0usize..3, pad in 0usize..3) {
        let raw = format!("{}{}{}{}", " ".repeat(pad), "0".repeat(zeros), p, " ".repeat(pad));
        let port = Port::parse(&raw).unwrap();
        prop_assert_eq!(port.to_string(), p.to_string());
    }

    #[test]
    fn range_text_is_normalized(a in 1u16.., b in 1u16.., zeros in 0usize..3) {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        let raw = format!(" {}{}-{}{} ", "0".repeat(zeros), from, "0".repeat(zeros), to);
        let port = Port::parse(&raw).unwrap();
        prop_assert_eq!(&port, &Port::Range { from, to });
        prop_assert_eq!(port.to_string(), format!("{from}-{to}"));
    }

    #[test]
    fn parse_never_panics(raw in any::<String>()) {
        let _ = Port::parse(&raw);
    }

    #[test]
    fn env_names_survive_encode(name in "[A-Z_][A-Z0-9_]{0,15}") {
        let port = Port::parse(&format!("env:{name}")).unwrap();
        prop_assert_eq!(port.to_string(), format!("env:{name}"));
    }
}
