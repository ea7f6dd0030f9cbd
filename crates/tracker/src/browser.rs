//! Coarse browser detection from the User-Agent header.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BrowserFamily {
    Chrome,
    Edge,
    Firefox,
    Safari,
    Other,
}

impl BrowserFamily {
    /// Chromium-based and iOS browsers also advertise `Safari/`, so they are
    /// matched first.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let has = |token: &str| user_agent.contains(token);
        if has("Edg/") || has("Edge/") {
            Self::Edge
        } else if has("Chrome/") || has("Chromium/") || has("CriOS/") {
            Self::Chrome
        } else if has("Firefox/") || has("FxiOS/") {
            Self::Firefox
        } else if has("Safari/") {
            Self::Safari
        } else {
            Self::Other
        }
    }
}
