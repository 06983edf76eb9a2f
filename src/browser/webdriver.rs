//! WebDriver session implementation
//!
//! Minimal W3C WebDriver client over HTTP. Drives one remote browser
//! session per task through a chromedriver/geckodriver-compatible
//! endpoint.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::session::{BrowserSession, SessionError, SessionFactory};
use crate::models::Locator;

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// WebDriver response envelope
#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
}

/// Factory opening WebDriver sessions against one endpoint
pub struct WebDriverFactory {
    client: Client,
    base_url: String,
    headless: bool,
}

impl WebDriverFactory {
    pub fn new(base_url: impl Into<String>, headless: bool) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SessionError::Create(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headless,
        })
    }

    fn capabilities(&self) -> Value {
        let mut args = vec!["--disable-gpu", "--no-sandbox"];
        if self.headless {
            args.push("--headless=new");
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
        let response = self
            .client
            .post(format!("{}/session", self.base_url))
            .json(&self.capabilities())
            .send()
            .await
            .map_err(|e| SessionError::Create(e.to_string()))?;

        let body: WireResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Create(e.to_string()))?;

        let session_id = body
            .value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| SessionError::Create("response carries no sessionId".into()))?
            .to_string();

        debug!("Opened WebDriver session {}", session_id);

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.base_url, session_id),
        }))
    }
}

/// One live WebDriver session
pub struct WebDriverSession {
    client: Client,
    session_url: String,
}

impl WebDriverSession {
    async fn command(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<Value, SessionError> {
        let url = format!("{}{}", self.session_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SessionError::Request(e.to_string()))?;

        let status = response.status();
        let body: WireResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Decode(e.to_string()))?;

        if status.is_success() {
            return Ok(body.value);
        }

        let error_code = body
            .value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let message = body
            .value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(error_code);

        if error_code == "no such element" {
            Err(SessionError::NotFound(message.to_string()))
        } else {
            Err(SessionError::Request(format!("{error_code}: {message}")))
        }
    }

    /// Resolve one locator to a WebDriver element reference
    async fn find_element(&self, locator: &Locator) -> Result<String, SessionError> {
        let (using, value) = wire_selector(locator);
        let found = self
            .command(
                reqwest::Method::POST,
                "/element",
                Some(json!({ "using": using, "value": value })),
            )
            .await
            .map_err(|e| match e {
                SessionError::NotFound(_) => SessionError::NotFound(locator.to_string()),
                other => other,
            })?;

        found
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SessionError::Decode("response carries no element reference".into()))
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.command(reqwest::Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<(), SessionError> {
        let element = self.find_element(locator).await?;
        self.command(
            reqwest::Method::POST,
            &format!("/element/{element}/click"),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), SessionError> {
        let element = self.find_element(locator).await?;
        self.command(
            reqwest::Method::POST,
            &format!("/element/{element}/value"),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
        let value = self
            .command(reqwest::Method::GET, "/screenshot", None)
            .await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| SessionError::Decode("screenshot payload is not a string".into()))?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| SessionError::Decode(e.to_string()))
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.command(reqwest::Method::DELETE, "", None).await?;
        debug!("Closed WebDriver session");
        Ok(())
    }
}

/// Map a locator to the WebDriver (using, value) pair
fn wire_selector(locator: &Locator) -> (&'static str, String) {
    match locator {
        Locator::Id(id) => ("css selector", format!("#{id}")),
        Locator::Css(css) => ("css selector", css.clone()),
        Locator::Text(text) => (
            "xpath",
            format!("//*[normalize-space(text())={}]", xpath_literal(text)),
        ),
    }
}

/// Quote a string as an XPath literal, handling embedded quotes
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{text}'")
    } else if !text.contains('"') {
        format!("\"{text}\"")
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_selector_priority_strategies() {
        let (using, value) = wire_selector(&Locator::Id("submit".into()));
        assert_eq!(using, "css selector");
        assert_eq!(value, "#submit");

        let (using, value) = wire_selector(&Locator::Css("input[name=q]".into()));
        assert_eq!(using, "css selector");
        assert_eq!(value, "input[name=q]");

        let (using, _) = wire_selector(&Locator::Text("Log in".into()));
        assert_eq!(using, "xpath");
    }

    #[test]
    fn xpath_literal_quoting() {
        assert_eq!(xpath_literal("plain"), "'plain'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert!(xpath_literal("both ' and \"").starts_with("concat("));
    }

    #[test]
    fn factory_builds_headless_capabilities() {
        let factory = WebDriverFactory::new("http://localhost:4444/", true).unwrap();
        assert_eq!(factory.base_url, "http://localhost:4444");

        let caps = factory.capabilities();
        let args = caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
    }
}
