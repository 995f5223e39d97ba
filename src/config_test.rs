use super::*;

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_coursehub_env() {
    unsafe {
        std::env::remove_var("COURSEHUB_BASE_URL");
        std::env::remove_var("COURSEHUB_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("COURSEHUB_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("COURSEHUB_SESSION_FILE");
        std::env::remove_var("COURSEHUB_LOCALE");
    }
}

#[test]
fn from_env_defaults_and_overrides() {
    unsafe { clear_coursehub_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.timeouts, Timeouts::default());
    assert_eq!(cfg.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
    assert_eq!(cfg.locale, Locale::En);

    unsafe {
        std::env::set_var("COURSEHUB_BASE_URL", "https://school.test/api/");
        std::env::set_var("COURSEHUB_REQUEST_TIMEOUT_SECS", "30");
        std::env::set_var("COURSEHUB_CONNECT_TIMEOUT_SECS", "3");
        std::env::set_var("COURSEHUB_SESSION_FILE", "/tmp/hub.json");
        std::env::set_var("COURSEHUB_LOCALE", "zh-CN");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, "https://school.test/api");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 30, connect_secs: 3 });
    assert_eq!(cfg.session_file, PathBuf::from("/tmp/hub.json"));
    assert_eq!(cfg.locale, Locale::ZhCn);

    unsafe {
        std::env::set_var("COURSEHUB_LOCALE", "fr");
    }
    let err = ClientConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("unknown COURSEHUB_LOCALE"));

    unsafe {
        std::env::set_var("COURSEHUB_LOCALE", "en");
        std::env::set_var("COURSEHUB_REQUEST_TIMEOUT_SECS", "0");
    }
    let err = ClientConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("greater than zero"));

    unsafe { clear_coursehub_env() };
}

#[test]
fn url_joins_without_double_slash() {
    let cfg = ClientConfig::new("http://localhost:8080/api/");
    assert_eq!(cfg.url("/courses/all"), "http://localhost:8080/api/courses/all");
    assert_eq!(cfg.url("auth/login"), "http://localhost:8080/api/auth/login");
}

#[test]
fn parse_locale_accepts_aliases() {
    assert_eq!(parse_locale(None).unwrap(), Locale::En);
    assert_eq!(parse_locale(Some("en-US")).unwrap(), Locale::En);
    assert_eq!(parse_locale(Some("zh_CN")).unwrap(), Locale::ZhCn);
    assert!(parse_locale(Some("de")).is_err());
}

#[test]
fn timeouts_convert_to_durations() {
    let t = Timeouts { request_secs: 15, connect_secs: 2 };
    assert_eq!(t.request(), Duration::from_secs(15));
    assert_eq!(t.connect(), Duration::from_secs(2));
}

#[test]
fn with_base_url_replaces_and_normalizes() {
    let cfg = ClientConfig::new("http://localhost:8080/api").with_base_url(" https://hub.example/api// ");
    assert_eq!(cfg.base_url, "https://hub.example/api");
    assert_eq!(cfg.timeouts, Timeouts::default());
}
