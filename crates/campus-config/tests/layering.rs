//! Integration tests for layered configuration loading.
//!
//! Uses `figment::Jail` so file and env manipulation stays sandboxed.

use campus_config::CampusConfig;
use figment::Jail;
use pretty_assertions::assert_eq;
use std::path::Path;

#[test]
fn defaults_without_any_source() {
    Jail::expect_with(|jail| {
        jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
        let config = CampusConfig::load(None).map_err(|e| e.to_string())?;
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, ".campus/campus.db");
        assert_eq!(config.general.timezone, "Asia/Kolkata");
        Ok(())
    });
}

#[test]
fn project_file_overrides_user_file() {
    Jail::expect_with(|jail| {
        let xdg = jail.directory().join("xdg");
        jail.set_env("XDG_CONFIG_HOME", xdg.display());
        std::fs::create_dir_all(xdg.join("campus")).map_err(|e| e.to_string())?;
        std::fs::write(
            xdg.join("campus").join("config.toml"),
            "[server]\nport = 4000\nhost = \"0.0.0.0\"\n\n[general]\ndefault_page_size = 25\n",
        )
        .map_err(|e| e.to_string())?;

        std::fs::create_dir_all(".campus").map_err(|e| e.to_string())?;
        jail.create_file(".campus/config.toml", "[server]\nport = 5000\n")?;

        let config = CampusConfig::load(None).map_err(|e| e.to_string())?;
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.general.default_page_size, 25);
        Ok(())
    });
}

#[test]
fn explicit_file_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
        std::fs::create_dir_all(".campus").map_err(|e| e.to_string())?;
        jail.create_file(".campus/config.toml", "[database]\npath = \"project.db\"\n")?;
        jail.create_file("custom.toml", "[database]\npath = \":memory:\"\n")?;

        let config = CampusConfig::load(Some(Path::new("custom.toml"))).map_err(|e| e.to_string())?;
        assert!(config.database.is_in_memory());
        Ok(())
    });
}

#[test]
fn env_beats_every_file() {
    Jail::expect_with(|jail| {
        jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
        jail.create_file("custom.toml", "[server]\nport = 4000\n")?;
        jail.set_env("CAMPUS_SERVER__PORT", "6000");
        jail.set_env("CAMPUS_PAYMENTS__KEY_ID", "rzp_test_1");
        jail.set_env("CAMPUS_PAYMENTS__KEY_SECRET", "secret");

        let config = CampusConfig::load(Some(Path::new("custom.toml"))).map_err(|e| e.to_string())?;
        assert_eq!(config.server.port, 6000);
        assert!(config.payments.is_configured());
        Ok(())
    });
}

#[test]
fn invalid_value_surfaces_as_error() {
    Jail::expect_with(|jail| {
        jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
        jail.set_env("CAMPUS_GENERAL__DEFAULT_PAGE_SIZE", "0");
        let err = CampusConfig::load(None).unwrap_err();
        assert!(err.to_string().contains("default_page_size"));
        Ok(())
    });
}

#[test]
fn malformed_toml_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
        jail.create_file("broken.toml", "[server\nport = ")?;
        let err = CampusConfig::load(Some(Path::new("broken.toml"))).unwrap_err();
        assert!(matches!(err, campus_config::ConfigError::Figment(_)));
        Ok(())
    });
}
