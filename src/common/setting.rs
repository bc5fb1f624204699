//! setting config file
//! `ENV` selects `config_<env>.toml`, defaults to `dev`

use std::time::Duration;
use std::{env, fs};
use lazy_static::lazy_static;
use serde::Deserialize;

use super::error::{BannerError, ErrorCode};

#[derive(Debug, Deserialize)]
pub struct Meta {
    pub application_name: String,
    pub default_venue_name: String,
}

#[derive(Debug, Deserialize)]
pub struct Env {
    pub env: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Web {
    pub web_host: String,
    pub web_port: u16,
    // host name printed by the console ADDRESS command
    pub panel_host: String,
    pub workers: usize,
}

impl Web {
    /// url of the browser control panel
    pub fn panel_url(&self) -> String {
        format!("http://{}:{}/", self.panel_host, self.web_port)
    }
}

#[derive(Debug, Deserialize)]
pub struct Control {
    pub submit_timeout_millis: u64,
    pub coordinator_tick_millis: u64,
    pub startup_timeout_millis: u64,
}

impl Control {
    /// `None` when the peers should wait for the coordinator without bound
    pub fn submit_timeout(&self) -> Option<Duration> {
        match self.submit_timeout_millis {
            0 => None,
            millis => Some(Duration::from_millis(millis)),
        }
    }

    pub fn coordinator_tick(&self) -> Duration {
        Duration::from_millis(self.coordinator_tick_millis.max(1))
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_millis)
    }
}

#[derive(Debug, Deserialize)]
pub struct Render {
    pub frame_interval_millis: u64,
}

impl Render {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_millis)
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub meta: Meta,
    pub env: Env,
    pub web: Web,
    pub control: Control,
    pub render: Render,
}

impl Settings {
    /// global settings, loaded once from `config_<ENV>.toml`
    pub fn get() -> Result<&'static Settings, BannerError> {
        lazy_static! {
            static ref CACHE: Result<Settings, BannerError> = Settings::load();
        }
        CACHE.as_ref().map_err(Clone::clone)
    }

    pub fn load() -> Result<Self, BannerError> {
        let env = match env::var("ENV") {
            Ok(e) => e,
            Err(_) => {
                log::warn!("no ENV set, use default: 'dev'");
                String::from("dev")
            }
        };
        Settings::load_from(&format!("config_{}.toml", env))
    }

    pub fn load_from(file_path: &str) -> Result<Self, BannerError> {
        let content = fs::read_to_string(file_path).map_err(|e| BannerError {
            code: ErrorCode::ConfigError,
            msg: format!("cannot read config file {}: {}", file_path, e),
        })?;
        Settings::from_toml(&content).map_err(|e| BannerError {
            code: ErrorCode::ConfigError,
            msg: format!("config file {} format invalid: {}", file_path, e),
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [meta]
        application_name = "banner"
        default_venue_name = "The Forum"

        [env]
        env = "test"
        log_level = "info"

        [web]
        web_host = "127.0.0.1"
        web_port = 8081
        panel_host = "banner.local"
        workers = 1

        [control]
        submit_timeout_millis = 0
        coordinator_tick_millis = 0
        startup_timeout_millis = 500

        [render]
        frame_interval_millis = 33
    "#;

    #[test]
    fn test_parse_settings() {
        let settings = Settings::from_toml(SAMPLE).unwrap();
        assert_eq!(settings.meta.default_venue_name, "The Forum");
        assert_eq!(settings.web.panel_url(), "http://banner.local:8081/");
        assert_eq!(settings.control.submit_timeout(), None);
        // a zero tick would spin the coordinator
        assert_eq!(settings.control.coordinator_tick(), Duration::from_millis(1));
        assert_eq!(settings.render.frame_interval(), Duration::from_millis(33));
    }

    #[test]
    fn test_missing_section_is_rejected() {
        assert!(Settings::from_toml("[meta]\napplication_name = \"x\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = env::temp_dir().join(format!("banner_settings_{}.toml", std::process::id()));
        fs::write(&path, SAMPLE).unwrap();
        let settings = Settings::load_from(path.to_str().unwrap()).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(settings.web.web_port, 8081);
    }

    #[test]
    fn test_load_errors_are_config_errors() {
        let err = Settings::load_from("config_does_not_exist.toml").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
        assert!(err.msg.contains("config_does_not_exist.toml"));

        let path = env::temp_dir().join(format!("banner_settings_bad_{}.toml", std::process::id()));
        fs::write(&path, "[meta]\napplication_name = \"x\"").unwrap();
        let err = Settings::load_from(path.to_str().unwrap()).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }
}
