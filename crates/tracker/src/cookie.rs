//! The tracking opt-out ("ignore") cookie.
//!
//! Browsers disagree on `SameSite`: `None` is only honoured on secure
//! connections, and some WebKit releases treat `SameSite=None` as `Strict`.
//! The attribute is therefore chosen per request.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use insight_core::config::TrackerConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::browser::BrowserFamily;

const IGNORE_COOKIE_VALUE: &str = "*";
const IGNORE_COOKIE_LIFETIME_DAYS: i64 = 365 * 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        })
    }
}

impl FromStr for SameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            other => Err(format!("unknown SameSite value '{other}'")),
        }
    }
}

/// Adjust the requested `SameSite` for the requesting browser. `None` means
/// the attribute is omitted.
pub fn same_site_for_browser(requested: SameSite, user_agent: &str, secure: bool) -> Option<SameSite> {
    if requested != SameSite::None {
        return Some(requested);
    }
    if BrowserFamily::from_user_agent(user_agent) == BrowserFamily::Safari {
        return None;
    }
    if !secure {
        return Some(SameSite::Lax);
    }
    Some(SameSite::None)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub expires: DateTime<Utc>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    /// Render as a `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        let mut out = format!(
            "{}={}; expires={}; path={}",
            self.name,
            self.value,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.path
        );
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            out.push_str(&format!("; SameSite={same_site}"));
        }
        out
    }
}

/// Builds the opt-out cookie from tracker configuration.
pub struct IgnoreCookie {
    name: String,
    path: String,
    same_site: SameSite,
    assume_secure_protocol: bool,
}

impl IgnoreCookie {
    pub fn new(config: &TrackerConfig) -> Self {
        let same_site = config.ignore_cookie_same_site.parse().unwrap_or_else(|e| {
            warn!(error = %e, "falling back to SameSite=Lax for the ignore cookie");
            SameSite::Lax
        });
        Self {
            name: config.ignore_cookie_name.clone(),
            path: config.ignore_cookie_path.clone(),
            same_site,
            assume_secure_protocol: config.assume_secure_protocol,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie that opts the browser out of tracking.
    pub fn set(&self, user_agent: &str, request_is_https: bool) -> Cookie {
        self.build(
            IGNORE_COOKIE_VALUE,
            Utc::now() + Duration::days(IGNORE_COOKIE_LIFETIME_DAYS),
            user_agent,
            request_is_https,
        )
    }

    /// Expired cookie that removes the opt-out.
    pub fn clear(&self, user_agent: &str, request_is_https: bool) -> Cookie {
        self.build("", DateTime::<Utc>::UNIX_EPOCH, user_agent, request_is_https)
    }

    /// Flip the opt-out state given the request's `Cookie` header.
    pub fn toggle(&self, cookie_header: Option<&str>, user_agent: &str, request_is_https: bool) -> Cookie {
        if self.is_present(cookie_header) {
            self.clear(user_agent, request_is_https)
        } else {
            self.set(user_agent, request_is_https)
        }
    }

    /// Whether the request's `Cookie` header carries the opt-out.
    pub fn is_present(&self, cookie_header: Option<&str>) -> bool {
        cookie_header.is_some_and(|header| {
            header.split(';').any(|pair| {
                pair.trim()
                    .split_once('=')
                    .is_some_and(|(name, value)| name == self.name && !value.is_empty())
            })
        })
    }

    fn build(&self, value: &str, expires: DateTime<Utc>, user_agent: &str, request_is_https: bool) -> Cookie {
        let secure = request_is_https || self.assume_secure_protocol;
        let same_site = same_site_for_browser(self.same_site, user_agent, secure);
        debug!(cookie = %self.name, ?same_site, secure, "ignore cookie built");
        Cookie {
            name: self.name.clone(),
            value: value.to_string(),
            path: self.path.clone(),
            expires,
            secure: secure || same_site == Some(SameSite::None),
            http_only: false,
            same_site,
        }
    }
}
