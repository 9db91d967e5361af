//! Alias codec properties over every declared wire enum.

use proptest::prelude::*;
use xr_config::alias::{decode, encode, WireEnum};
use xr_config::enums::*;
use xr_types::CodecError;

fn assert_roundtrip<T: WireEnum>() {
    for v in T::values() {
        let token = encode(v);
        assert_eq!(decode::<T>(token).unwrap(), v, "{} token {token:?}", T::ENUM_NAME);
        assert_eq!(decode::<T>(&token.to_ascii_uppercase()).unwrap(), v);
        assert_eq!(decode::<T>(&token.to_ascii_lowercase()).unwrap(), v);
    }
}

macro_rules! roundtrip_all {
    ($($ty:ty),+ $(,)?) => {
        #[test]
        fn every_value_survives_encode_then_decode() {
            $( assert_roundtrip::<$ty>(); )+
        }
    };
}

roundtrip_all!(
    StreamNetwork,
    StreamSecurity,
    Fingerprint,
    Flow,
    HeadersType,
    KcpHeaderType,
    XHttpMode,
    EncryptionMethod,
    VMessSecurity,
    VlessDecryption,
    SocksAuth,
    InboundProtocol,
    OutboundProtocol,
    LogLevel,
    DomainStrategy,
    RoutingDomainStrategy,
    DnsQueryStrategy,
    TransportProtocol,
    TrafficType,
    AllocateStrategy,
    TProxy,
    TcpCongestion,
    CertificateUsage,
    BalancerStrategyType,
    NonIpQueryType,
    RoutingRuleType,
    NetProtocol,
    AddressPortStrategy,
    OperatingSystem,
);

#[test]
fn alternate_aliases_decode_to_the_same_value() {
    let pairs: &[(&str, StreamNetwork)] = &[
        ("tcp", StreamNetwork::Raw),
        ("splithttp", StreamNetwork::XHttp),
        ("mkcp", StreamNetwork::Kcp),
        ("websocket", StreamNetwork::Ws),
    ];
    for (token, expected) in pairs {
        assert_eq!(StreamNetwork::decode(token).unwrap(), *expected);
    }
    assert_eq!(
        EncryptionMethod::decode("plain").unwrap(),
        EncryptionMethod::None
    );
    assert_eq!(
        InboundProtocol::decode("tunnel").unwrap(),
        InboundProtocol::DokodemoDoor
    );
}

#[test]
fn declared_name_is_accepted_when_no_alias_matches() {
    assert_eq!(StreamNetwork::decode("HttpUpgrade").unwrap(), StreamNetwork::HttpUpgrade);
    assert_eq!(Flow::decode("XtlsRprxVision").unwrap(), Flow::XtlsRprxVision);
    assert_eq!(
        DomainStrategy::decode("ForceIpv6v4").unwrap(),
        DomainStrategy::ForceIpv6v4
    );
}

#[test]
fn unknown_token_reports_enum_and_token() {
    assert_eq!(
        StreamNetwork::decode("quic").unwrap_err(),
        CodecError::unknown_enum_token("StreamNetwork", "quic")
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn random_casing_of_network_tokens(
        v in prop::sample::select(StreamNetwork::values()),
        mask in any::<u64>(),
    ) {
        let token: String = encode(v)
            .chars()
            .enumerate()
            .map(|(i, c)| if mask >> (i % 64) & 1 == 1 { c.to_ascii_uppercase() } else { c })
            .collect();
        prop_assert_eq!(StreamNetwork::decode(&token).unwrap(), v);
    }

    #[test]
    fn decode_never_panics(token in ".{0,24}") {
        let _ = Fingerprint::decode(&token);
        let _ = DomainStrategy::decode(&token);
    }
}
