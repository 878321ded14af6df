use std::env;

use crate::domain::{Error, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    /// Collector destination; unset means this instance does not push.
    pub collector_host: Option<String>,
    pub collector_port: u16,
    pub collector_context_path: String,
    /// Route the collector accepts pushed snapshots on.
    pub push_path: String,
    pub app_name: Option<String>,
    pub app_port: u16,
    pub app_context_path: String,
    pub app_host: Option<String>,
    pub use_public_ip: bool,
    pub ip_service_url: String,
    pub push_period_secs: u64,
    pub push_delay_secs: u64,
    pub announce_period_secs: u64,
    /// Static registry seed: `name=url url;name2=url` entries.
    pub applications: Vec<(String, String)>,
}

/// Where a pushing instance sends its data.
#[derive(Debug, Clone)]
pub struct PushSettings {
    pub app_name: String,
    pub push_url: String,
    pub admin_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("RELAYMON_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);
        Self {
            port,
            log_level: env::var("RELAYMON_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            collector_host: env::var("RELAYMON_COLLECTOR_HOST").ok().filter(|s| !s.is_empty()),
            collector_port: env::var("RELAYMON_COLLECTOR_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(80),
            collector_context_path: env::var("RELAYMON_COLLECTOR_CONTEXT_PATH")
                .unwrap_or_default(),
            push_path: env::var("RELAYMON_PUSH_PATH")
                .unwrap_or_else(|_| "/monitoring/push".to_string()),
            app_name: env::var("RELAYMON_APP_NAME").ok().filter(|s| !s.is_empty()),
            app_port: env::var("RELAYMON_APP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(port),
            app_context_path: env::var("RELAYMON_APP_CONTEXT_PATH").unwrap_or_default(),
            app_host: env::var("RELAYMON_APP_HOST").ok().filter(|s| !s.is_empty()),
            use_public_ip: env::var("RELAYMON_USE_PUBLIC_IP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            ip_service_url: env::var("RELAYMON_IP_SERVICE_URL")
                .unwrap_or_else(|_| "https://api.ipify.org".to_string()),
            push_period_secs: env::var("RELAYMON_PUSH_PERIOD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            push_delay_secs: env::var("RELAYMON_PUSH_DELAY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            announce_period_secs: env::var("RELAYMON_ANNOUNCE_PERIOD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            applications: env::var("RELAYMON_APPLICATIONS")
                .map(|s| parse_applications(&s))
                .unwrap_or_default(),
        }
    }

    /// Push destination, if this instance is configured as a pushing
    /// instance. A collector host without an application name is a
    /// configuration mistake worth failing startup over.
    pub fn push_settings(&self) -> Result<Option<PushSettings>> {
        let Some(host) = &self.collector_host else {
            return Ok(None);
        };
        let Some(app_name) = &self.app_name else {
            return Err(Error::ConfigurationMissing("RELAYMON_APP_NAME"));
        };

        let base = format!(
            "http://{}:{}{}",
            host, self.collector_port, self.collector_context_path
        );
        Ok(Some(PushSettings {
            app_name: app_name.clone(),
            push_url: format!("{}{}", base, self.push_path),
            admin_url: format!("{base}/monitoring"),
        }))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_applications(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter_map(|entry| {
            let (name, urls) = entry.split_once('=')?;
            let name = name.trim();
            let urls = urls.trim();
            if name.is_empty() || urls.is_empty() {
                return None;
            }
            Some((name.to_string(), urls.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            port: 8080,
            log_level: "info".to_string(),
            collector_host: None,
            collector_port: 80,
            collector_context_path: String::new(),
            push_path: "/monitoring/push".to_string(),
            app_name: None,
            app_port: 8080,
            app_context_path: String::new(),
            app_host: None,
            use_public_ip: false,
            ip_service_url: "https://api.ipify.org".to_string(),
            push_period_secs: 60,
            push_delay_secs: 30,
            announce_period_secs: 30,
            applications: Vec::new(),
        }
    }

    #[test]
    fn test_parse_applications_seed() {
        let parsed = parse_applications("Orders=http://a:1/x http://b:2/y; Billing = http://c:3/z;=bad;empty=");
        assert_eq!(
            parsed,
            vec![
                ("Orders".to_string(), "http://a:1/x http://b:2/y".to_string()),
                ("Billing".to_string(), "http://c:3/z".to_string()),
            ]
        );
    }

    #[test]
    fn test_push_settings_absent_without_collector() {
        assert!(base_config().push_settings().unwrap().is_none());
    }

    #[test]
    fn test_push_settings_require_app_name() {
        let mut config = base_config();
        config.collector_host = Some("collector.internal".to_string());

        assert!(matches!(
            config.push_settings(),
            Err(Error::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_push_settings_urls() {
        let mut config = base_config();
        config.collector_host = Some("collector.internal".to_string());
        config.collector_port = 9090;
        config.collector_context_path = "/melody".to_string();
        config.app_name = Some("Orders".to_string());

        let settings = config.push_settings().unwrap().unwrap();
        assert_eq!(
            settings.push_url,
            "http://collector.internal:9090/melody/monitoring/push"
        );
        assert_eq!(
            settings.admin_url,
            "http://collector.internal:9090/melody/monitoring"
        );
    }
}
