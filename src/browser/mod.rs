//! Browser session boundary and WebDriver implementation
//!
//! The executor and activity runner only see the traits in `session`;
//! `webdriver` supplies the concrete HTTP-protocol session.

mod session;
mod webdriver;

pub use session::{BrowserSession, SessionError, SessionFactory};
pub use webdriver::{WebDriverFactory, WebDriverSession};
