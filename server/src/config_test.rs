use super::*;

// =============================================================================
// parse_bool
// =============================================================================

#[test]
fn parse_bool_true_variants() {
    for val in ["1", "true", "yes", "on", "TRUE", "On", "  yes  "] {
        assert_eq!(parse_bool(val), Some(true), "expected true for {val:?}");
    }
}

#[test]
fn parse_bool_false_variants() {
    for val in ["0", "false", "no", "off", "False"] {
        assert_eq!(parse_bool(val), Some(false), "expected false for {val:?}");
    }
}

#[test]
fn parse_bool_invalid_returns_none() {
    assert_eq!(parse_bool("maybe"), None);
    assert_eq!(parse_bool(""), None);
}

// =============================================================================
// env_parse: uses unique env var names to avoid races with parallel tests.
// =============================================================================

#[test]
fn env_parse_reads_value() {
    let key = "__TEST_SERVER_EP_VALUE_311__";
    unsafe { std::env::set_var(key, "120") };
    assert_eq!(env_parse(key, 5_u64), 120);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_falls_back_on_garbage() {
    let key = "__TEST_SERVER_EP_GARBAGE_312__";
    unsafe { std::env::set_var(key, "twelve") };
    assert_eq!(env_parse(key, 5_u64), 5);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_unset_uses_default() {
    assert_eq!(env_parse("__TEST_SERVER_EP_SURELY_UNSET_313__", 9_u16), 9);
}

// =============================================================================
// env_secs
// =============================================================================

#[test]
fn env_secs_accepts_value_in_range() {
    let key = "__TEST_SERVER_ES_VALUE_321__";
    unsafe { std::env::set_var(key, "1800") };
    assert_eq!(env_secs(key, 60, MAX_TOKEN_TTL_SECS).unwrap(), Duration::from_secs(1800));
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_secs_rejects_zero() {
    let key = "__TEST_SERVER_ES_ZERO_322__";
    unsafe { std::env::set_var(key, "0") };
    let err = env_secs(key, 60, MAX_TOKEN_TTL_SECS).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: k, ref value } if k == key && value == "0"));
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_secs_rejects_ttl_past_cookie_limit() {
    let key = "__TEST_SERVER_ES_HUGE_323__";
    unsafe { std::env::set_var(key, u64::MAX.to_string()) };
    assert!(matches!(env_secs(key, 60, MAX_TOKEN_TTL_SECS), Err(ConfigError::Invalid { .. })));
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_secs_unset_uses_default() {
    assert_eq!(
        env_secs("__TEST_SERVER_ES_SURELY_UNSET_324__", 60, MAX_TOKEN_TTL_SECS).unwrap(),
        Duration::from_secs(60)
    );
}

// =============================================================================
// defaults
// =============================================================================

#[test]
fn default_config_matches_documented_values() {
    let config = ServerConfig::default();
    assert_eq!(config.port, 5000);
    assert_eq!(config.access_ttl, Duration::from_secs(900));
    assert_eq!(config.refresh_ttl, Duration::from_secs(604_800));
    assert!(!config.cookie_secure);
    assert!(config.cors_origin.is_none());
    assert!(config.seed_account.is_none());
}
