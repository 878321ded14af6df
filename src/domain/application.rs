use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// A named, independently-running instrumented process known to the
/// collector. URL order defines fetch preference; push-registered entries
/// carry no URLs until an operator adds some.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub urls: Vec<String>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl Application {
    pub fn new(name: impl Into<String>, urls: Vec<String>) -> Self {
        Self {
            name: name.into(),
            urls,
            last_seen: None,
        }
    }
}

/// Reject any URL that does not use an allowed transport scheme.
pub fn validate_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::InvalidUrlScheme {
            url: url.to_string(),
        })
    }
}

/// Split an admin form value into URLs. The form accepts whitespace and
/// commas as separators; every entry must pass scheme validation.
pub fn parse_url_list(value: &str) -> Result<Vec<String>> {
    let urls: Vec<String> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect();

    for url in &urls {
        validate_url(url)?;
    }
    Ok(urls)
}
