use super::ms;
use crate::proto::{ConfigError, Mode, ProtocolConfig};

#[test]
fn presets_follow_mode() {
    let sr = ProtocolConfig::for_mode(Mode::SelectiveRepeat, 8);
    assert_eq!(sr.base_rto, ms(12));
    assert_eq!(sr.rtt_floor, ms(10));
    assert_eq!(sr.effective_window(), 8);

    let gbn = ProtocolConfig::for_mode(Mode::GoBackN, 8);
    assert_eq!(gbn.base_rto, ms(18));

    let abt = ProtocolConfig::for_mode(Mode::AlternatingBit, 8);
    assert_eq!(abt.effective_window(), 1);
}

#[test]
fn validate_rejects_unusable_configs() {
    let ok = ProtocolConfig::for_mode(Mode::GoBackN, 4);
    assert_eq!(ok.validate(), Ok(()));

    let mut cfg = ok.clone();
    cfg.window = 0;
    assert_eq!(cfg.validate(), Err(ConfigError::ZeroWindow));

    let cfg = ok.clone().with_base_rto(ms(0));
    assert_eq!(cfg.validate(), Err(ConfigError::ZeroBaseRto));

    let cfg = ok.with_base_rto(ms(5));
    assert!(matches!(cfg.validate(), Err(ConfigError::FloorTooHigh { .. })));
}

#[test]
fn mode_policies() {
    assert!(Mode::GoBackN.cumulative_acks());
    assert!(!Mode::SelectiveRepeat.cumulative_acks());
    assert!(!Mode::AlternatingBit.cumulative_acks());
    assert!(Mode::GoBackN.retransmits_whole_window());
    assert!(Mode::AlternatingBit.retransmits_whole_window());
    assert!(!Mode::SelectiveRepeat.retransmits_whole_window());
}

#[test]
fn config_loads_from_json() {
    let raw = r#"{ "mode": "selective_repeat", "window": 4, "base_rto": 18000000, "rtt_floor": 10000000 }"#;
    let cfg: ProtocolConfig = serde_json::from_str(raw).expect("parse config");
    assert_eq!(cfg, ProtocolConfig::for_mode(Mode::SelectiveRepeat, 4).with_base_rto(ms(18)));

    let mode: Mode = serde_json::from_str("\"go_back_n\"").expect("parse mode");
    assert_eq!(mode, Mode::GoBackN);
}
