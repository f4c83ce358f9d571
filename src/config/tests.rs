use super::*;

#[test]
fn defaults_resolve() {
    let settings = Settings::from_raw(RawSettings::default()).expect("default settings");

    assert_eq!(settings.server.public_addr.port(), DEFAULT_PUBLIC_PORT);
    assert_eq!(settings.server.admin_addr.port(), DEFAULT_ADMIN_PORT);
    assert!(settings.database.url.is_none());
    assert_eq!(settings.feed.page_size.get(), DEFAULT_FEED_PAGE_SIZE);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.ttl, Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
}

#[test]
fn zero_page_size_is_rejected() {
    let raw = RawSettings {
        feed: RawFeedSettings { page_size: Some(0) },
        ..Default::default()
    };
    let err = Settings::from_raw(raw).expect_err("zero page size rejected");
    assert!(matches!(err, LoadError::Invalid { key: "feed.page_size", .. }));
}

#[test]
fn zero_cache_ttl_is_rejected() {
    let raw = RawSettings {
        cache: RawCacheSettings {
            ttl_seconds: Some(0),
            ..Default::default()
        },
        ..Default::default()
    };
    let err = Settings::from_raw(raw).expect_err("zero ttl rejected");
    assert!(matches!(err, LoadError::Invalid { key: "cache.ttl_seconds", .. }));
}

#[test]
fn colliding_listener_ports_are_rejected() {
    let raw = RawSettings {
        server: RawServerSettings {
            public_port: Some(8080),
            admin_port: Some(8080),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn unknown_log_level_is_rejected() {
    let raw = RawSettings {
        logging: RawLoggingSettings {
            level: Some("loud".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn serve_overrides_take_precedence() {
    let mut raw = RawSettings {
        feed: RawFeedSettings { page_size: Some(6) },
        ..Default::default()
    };
    let overrides = ServeOverrides {
        feed_page_size: Some(25),
        cache_enabled: Some(false),
        database_url: Some("postgres://localhost/brusio".to_string()),
        ..Default::default()
    };
    raw.apply_serve_overrides(&overrides);

    let settings = Settings::from_raw(raw).expect("settings with overrides");
    assert_eq!(settings.feed.page_size.get(), 25);
    assert!(!settings.cache.enabled);
    assert_eq!(
        settings.database.url.as_deref(),
        Some("postgres://localhost/brusio")
    );
}
