//! Browser session boundary
//!
//! Defines the narrow capability the activity runner consumes: a fresh,
//! isolated session per task that can navigate, interact, and capture
//! screenshots. Implementations own their transport details.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Locator;

/// Session boundary errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to open browser session: {0}")]
    Create(String),

    #[error("No element resolved for {0}")]
    NotFound(String),

    #[error("Session request failed: {0}")]
    Request(String),

    #[error("Malformed session response: {0}")]
    Decode(String),
}

impl SessionError {
    /// True when the error means "this locator matched nothing", so the
    /// caller may fall through to the next resolution strategy.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }
}

/// One isolated browser session, driven by a single task at a time.
///
/// Interaction methods resolve exactly one locator; strategy fallback
/// across multiple locators is the caller's concern. Every implementation
/// must release its underlying resources in `close`, whatever happened
/// before.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open a URL
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// Click the element the locator resolves to
    async fn click(&self, locator: &Locator) -> Result<(), SessionError>;

    /// Type text into the element the locator resolves to
    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), SessionError>;

    /// Capture a PNG screenshot of the current page
    async fn screenshot(&self) -> Result<Vec<u8>, SessionError>;

    /// Release the session and its resources
    async fn close(&self) -> Result<(), SessionError>;
}

/// Opens a fresh session per task
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, SessionError>;
}
