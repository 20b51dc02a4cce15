//! Page sessions and helpers for driving the target site.

pub mod browser;
pub mod fixture;
pub mod pacing;
pub mod session;
pub mod types;

pub use browser::{BrowserEngineConfig, ChromiumSession};
pub use fixture::{FixturePage, FixtureSession};
pub use pacing::{DelayConfig, Pacer};
pub use session::{
    dismiss_cookie_popup, scroll_until_stable, PageSession, SessionError, POPUP_WAIT,
};
pub use types::{ClickTarget, PageElement};
