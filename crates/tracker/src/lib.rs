//! Tracker-side helpers: browser detection and the opt-out cookie.

pub mod browser;
pub mod cookie;

pub use browser::BrowserFamily;
pub use cookie::{same_site_for_browser, Cookie, IgnoreCookie, SameSite};
