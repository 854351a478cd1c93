//! Tap configuration types
//!
//! `MedusaConfig` mirrors the JSON config file. Unknown keys are kept in
//! `extra` so that rewriting the file after a token refresh never drops them.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Configuration consumed by the tap (and rewritten on token refresh)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedusaConfig {
    /// Root URL of the Medusa backend
    #[serde(default)]
    pub base_url: String,

    /// Static admin API key; takes priority over email/password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Admin user email for the login exchange
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Admin user password for the login exchange
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// User-Agent header value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Earliest timestamp to replicate (ISO date or datetime)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Cached bearer token from the last login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Expiry of `access_token` as Unix seconds (number or numeric string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<Value>,

    /// Any other keys present in the config file
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How requests are authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// `x-medusa-access-token` header with a static key
    ApiKey(String),
    /// Bearer token obtained through the email/password login exchange
    EmailPassword {
        /// Login email
        email: String,
        /// Login password
        password: String,
    },
}

impl MedusaConfig {
    /// Create a config pointing at a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Parse a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set email/password credentials
    #[must_use]
    pub fn with_credentials(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self.password = Some(password.into());
        self
    }

    /// Set the User-Agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the start date
    #[must_use]
    pub fn with_start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    /// Check required keys and value formats
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("base_url"));
        }
        url::Url::parse(&self.base_url)?;

        self.auth_mode()?;

        if let Some(start_date) = &self.start_date {
            if parse_timestamp(start_date).is_none() {
                return Err(Error::invalid_value(
                    "start_date",
                    format!("'{start_date}' is not an ISO-8601 date or datetime"),
                ));
            }
        }

        Ok(())
    }

    /// Resolve the authentication mode; the API key wins when both are set
    pub fn auth_mode(&self) -> Result<AuthMode> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            return Ok(AuthMode::ApiKey(key.to_string()));
        }

        let email = non_empty(self.email.as_deref()).ok_or_else(|| Error::missing_field("email"))?;
        let password =
            non_empty(self.password.as_deref()).ok_or_else(|| Error::missing_field("password"))?;

        Ok(AuthMode::EmailPassword {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    /// Base URL with trailing slashes removed
    pub fn root_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Parsed `start_date`, if present and well-formed
    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date.as_deref().and_then(parse_timestamp)
    }

    /// Parsed token expiry; anything unparseable reads as absent
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let seconds = match self.expires_in.as_ref()? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64))?,
            Value::String(s) => s.trim().parse::<i64>().ok()?,
            _ => return None,
        };
        if seconds == 0 {
            return None;
        }
        Utc.timestamp_opt(seconds, 0).single()
    }

    /// Replace the cached credentials
    pub fn set_credentials(&mut self, token: impl Into<String>, expires_at: DateTime<Utc>) {
        self.access_token = Some(token.into());
        self.expires_in = Some(Value::from(expires_at.timestamp()));
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Parse an ISO-8601 date or datetime; naive values are taken as UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
