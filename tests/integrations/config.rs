use clap::Parser;
use figment::Jail;
use mailcow_exporter::{
    cli::Cli,
    config::{Config, ConfigError},
};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const BASE_URL: &str = "https://mail.example.com/api/v1/get/";

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["mailcow-exporter"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_load_from_environment() {
    Jail::expect_with(|jail| {
        jail.set_env("API_KEY", "secret");
        jail.set_env("BASE_URL", BASE_URL);
        jail.set_env("PORT", "9100");
        jail.set_env("SCRAPE_INTERVAL", "60");
        jail.set_env("FETCH_TIMEOUT", "5");
        jail.set_env("LOG_LEVEL", "debug");

        let config = Config::load(&cli(&[])).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.base_url, BASE_URL);
        assert_eq!(config.port, 9100);
        assert_eq!(config.scrape_interval(), Duration::from_secs(60));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.log_level, "debug");
        Ok(())
    });
}

#[test]
fn test_defaults_apply_when_only_required_values_are_set() {
    Jail::expect_with(|jail| {
        jail.set_env("API_KEY", "secret");
        jail.set_env("BASE_URL", BASE_URL);

        let config = Config::load(&cli(&[])).unwrap();
        assert_eq!(config.port, 9999);
        assert_eq!(config.scrape_interval(), Duration::from_secs(1800));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:9999");
        Ok(())
    });
}

#[test]
fn test_missing_api_key_is_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("BASE_URL", BASE_URL);

        let err = Config::load(&cli(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey), "{err}");
        assert_eq!(err.to_string(), "API_KEY is not set");
        Ok(())
    });
}

#[test]
fn test_missing_base_url_is_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("API_KEY", "secret");

        let err = Config::load(&cli(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBaseUrl), "{err}");
        Ok(())
    });
}

#[test]
fn test_file_then_env_then_cli_precedence() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "mailcow.toml",
            r#"
                api_key = "from-file"
                base_url = "https://file.example.com/api/v1/get/"
                port = 9001
                scrape_interval = 600
                fetch_timeout = 10
            "#,
        )?;
        jail.set_env("PORT", "9002");
        jail.set_env("SCRAPE_INTERVAL", "300");

        let config = Config::load(&cli(&["--config", "mailcow.toml", "--port", "9003"])).unwrap();
        assert_eq!(config.api_key, "from-file");
        assert_eq!(config.base_url, "https://file.example.com/api/v1/get/");
        assert_eq!(config.port, 9003);
        assert_eq!(config.scrape_interval, 300);
        assert_eq!(config.fetch_timeout, 10);
        Ok(())
    });
}

#[test]
fn test_load_full_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
            api_key = "file-key"
            base_url = "http://10.0.0.5/api/v1/get"
            port = 9200
            scrape_interval = 120
            fetch_timeout = 15
            log_level = "warn"
        "#
    )
    .unwrap();
    let path = file.path().to_str().unwrap().to_string();

    Jail::expect_with(|_jail| {
        let config = Config::load(&cli(&["--config", &path])).unwrap();
        assert_eq!(config.api_key, "file-key");
        assert_eq!(config.base_url, "http://10.0.0.5/api/v1/get");
        assert_eq!(config.port, 9200);
        assert_eq!(config.scrape_interval(), Duration::from_secs(120));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(15));
        assert_eq!(config.log_level, "warn");
        Ok(())
    });
}

#[test]
fn test_missing_config_file_is_an_error() {
    Jail::expect_with(|jail| {
        jail.set_env("API_KEY", "secret");
        jail.set_env("BASE_URL", BASE_URL);

        let err = Config::load(&cli(&["-c", "does-not-exist.toml"])).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)), "{err}");
        assert!(err.to_string().contains("does-not-exist.toml"));
        Ok(())
    });
}

#[test]
fn test_malformed_port_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.set_env("API_KEY", "secret");
        jail.set_env("BASE_URL", BASE_URL);
        jail.set_env("PORT", "abc");

        let err = Config::load(&cli(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)), "{err}");
        Ok(())
    });
}

#[test]
fn test_zero_scrape_interval_is_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("API_KEY", "secret");
        jail.set_env("BASE_URL", BASE_URL);

        let err = Config::load(&cli(&["--scrape-interval", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroDuration("SCRAPE_INTERVAL")), "{err}");
        Ok(())
    });
}

#[test]
fn test_non_http_base_url_is_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("API_KEY", "secret");
        jail.set_env("BASE_URL", "ftp://mail.example.com/");

        let err = Config::load(&cli(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)), "{err}");
        Ok(())
    });
}

#[test]
fn test_numeric_api_key_is_kept_verbatim() {
    Jail::expect_with(|jail| {
        jail.set_env("API_KEY", "123456");
        jail.set_env("BASE_URL", BASE_URL);
        jail.set_env("LOG_LEVEL", "1");

        let config = Config::load(&cli(&[])).unwrap();
        assert_eq!(config.api_key, "123456");
        assert_eq!(config.log_level, "1");

        jail.set_env("API_KEY", "0012.50");
        let config = Config::load(&cli(&[])).unwrap();
        assert_eq!(config.api_key, "0012.50");
        Ok(())
    });
}
