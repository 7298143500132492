// WebDriver-backed surface - steers a local chromedriver over the W3C wire protocol
use crate::application::surface::{RenderedSurface, SurfaceAction, SurfaceError, SurfaceFactory};
use crate::infrastructure::config::SurfaceSettings;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use std::time::{Duration, Instant};

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const ENTER_KEY: &str = "\u{e007}";

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Per-request ceiling so a wedged chromedriver cannot block a tick forever.
const WIRE_TIMEOUT: Duration = Duration::from_secs(60);
/// Superset needs a while to lay out a dashboard after navigation.
const RENDER_WAIT: Duration = Duration::from_secs(10);
const POST_LOGIN_WAIT: Duration = Duration::from_secs(15);
const MENU_SETTLE: Duration = Duration::from_secs(2);

// Superset selectors, current as of the 4.x theme. These break on portal
// redesigns; that fragility is accepted.
const MENU_TRIGGER: &str = "//button[@aria-label='Menu actions trigger']";
const FULLSCREEN_ITEM: &str = "//li[contains(text(), 'Enter fullscreen')]";
const AUTO_REFRESH_ITEM: &str = "//span[contains(text(), 'Set auto-refresh interval')]";
const REFRESH_DROPDOWN: &str = "//div[@aria-label='Refresh interval']";
const SAVE_FOR_SESSION: &str = "//button[contains(@class, 'superset-button-primary')]//span[text()='Save for this session']/parent::button";
const COLLAPSE_FILTERS: &str = "//button[@data-test='filter-bar__collapse-button']";
const USERNAME_FIELD: &str = "//input[@name='username']";
const PASSWORD_FIELD: &str = "//input[@name='password']";

pub struct WebDriverSurface {
    http: reqwest::Client,
    driver_url: String,
    session_id: String,
}

impl WebDriverSurface {
    async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, SurfaceError> {
        let url = format!("{}/session/{}{}", self.driver_url, self.session_id, path);
        wire_call(&self.http, method, &url, body).await
    }

    async fn find_element(&self, xpath: &str) -> Result<String, SurfaceError> {
        let value = self
            .call(
                Method::POST,
                "/element",
                Some(&json!({ "using": "xpath", "value": xpath })),
            )
            .await?;
        value[ELEMENT_KEY]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SurfaceError::Fault("malformed element response".to_string()))
    }

    /// Poll for an element the way a WebDriverWait would.
    async fn wait_for(&self, xpath: &str) -> Result<String, SurfaceError> {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        loop {
            match self.find_element(xpath).await {
                Ok(element_id) => return Ok(element_id),
                Err(SurfaceError::Transient(_)) if Instant::now() < deadline => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(SurfaceError::Transient(_)) => {
                    return Err(SurfaceError::Transient(format!(
                        "element '{xpath}' did not appear within {}s",
                        WAIT_TIMEOUT.as_secs()
                    )));
                }
                Err(fault) => return Err(fault),
            }
        }
    }

    async fn click(&self, xpath: &str) -> Result<(), SurfaceError> {
        let element_id = self.wait_for(xpath).await?;
        self.call(
            Method::POST,
            &format!("/element/{element_id}/click"),
            Some(&json!({})),
        )
        .await?;
        Ok(())
    }

    async fn send_keys(&self, element_id: &str, text: &str) -> Result<(), SurfaceError> {
        self.call(
            Method::POST,
            &format!("/element/{element_id}/value"),
            Some(&json!({ "text": text })),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RenderedSurface for WebDriverSurface {
    async fn open(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.call(Method::POST, "/url", Some(&json!({ "url": url })))
            .await
            .map_err(as_fault)?;
        tokio::time::sleep(RENDER_WAIT).await;
        Ok(())
    }

    async fn login(&mut self, username: &str, password: &str) -> Result<(), SurfaceError> {
        let username_field = self.wait_for(USERNAME_FIELD).await.map_err(as_fault)?;
        self.send_keys(&username_field, username).await.map_err(as_fault)?;

        let password_field = self.wait_for(PASSWORD_FIELD).await.map_err(as_fault)?;
        self.send_keys(&password_field, &format!("{password}{ENTER_KEY}"))
            .await
            .map_err(as_fault)?;

        tokio::time::sleep(POST_LOGIN_WAIT).await;
        Ok(())
    }

    async fn current_title(&mut self) -> Result<String, SurfaceError> {
        let value = self.call(Method::GET, "/title", None).await.map_err(as_fault)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SurfaceError::Fault("malformed title response".to_string()))
    }

    async fn perform(&mut self, action: SurfaceAction) -> Result<(), SurfaceError> {
        match action {
            SurfaceAction::EnterFullscreen => {
                self.click(MENU_TRIGGER).await?;
                tokio::time::sleep(MENU_SETTLE).await;
                self.click(FULLSCREEN_ITEM).await?;
                tokio::time::sleep(MENU_SETTLE).await;
            }
            SurfaceAction::OpenMenu => {
                self.click(MENU_TRIGGER).await?;
            }
            SurfaceAction::SetAutoRefresh(minutes) => {
                self.click(MENU_TRIGGER).await?;
                tokio::time::sleep(MENU_SETTLE).await;
                self.click(AUTO_REFRESH_ITEM).await?;
                tokio::time::sleep(MENU_SETTLE).await;
                self.click(REFRESH_DROPDOWN).await?;
                self.click(&format!(
                    "//div[@class='ant-select-item-option-content' and text()='{minutes} minutes']"
                ))
                .await?;
                self.click(SAVE_FOR_SESSION).await?;
                tokio::time::sleep(MENU_SETTLE).await;
                // Close the menu again so it does not sit over the charts.
                self.click(MENU_TRIGGER).await?;
            }
            SurfaceAction::CollapseFilters => {
                self.click(COLLAPSE_FILTERS).await?;
            }
            SurfaceAction::ClearTooltips => {
                // A click in the top-left corner, away from charts and text,
                // dismisses any hover popover.
                self.call(
                    Method::POST,
                    "/actions",
                    Some(&json!({
                        "actions": [{
                            "type": "pointer",
                            "id": "mouse",
                            "parameters": { "pointerType": "mouse" },
                            "actions": [
                                { "type": "pointerMove", "duration": 0, "x": 10, "y": 10 },
                                { "type": "pointerDown", "button": 0 },
                                { "type": "pointerUp", "button": 0 }
                            ]
                        }]
                    })),
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn teardown(&mut self) {
        if let Err(e) = self.call(Method::DELETE, "", None).await {
            tracing::debug!(error = %e, "session already gone during teardown");
        }
    }
}

pub struct WebDriverSurfaceFactory {
    settings: SurfaceSettings,
    http: reqwest::Client,
}

impl WebDriverSurfaceFactory {
    pub fn new(settings: SurfaceSettings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
        }
    }

    async fn new_session(&self, binary: &str) -> Result<WebDriverSurface, SurfaceError> {
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "binary": binary,
                        "args": [
                            "--start-fullscreen",
                            "--disable-session-crashed-bubble",
                            "--no-sandbox",
                            "--disable-dev-shm-usage"
                        ],
                        "prefs": {
                            "credentials_enable_service": false,
                            "profile.password_manager_enabled": false
                        },
                        "excludeSwitches": ["enable-automation"]
                    }
                }
            }
        });
        let url = format!("{}/session", self.settings.webdriver_url);
        let value = wire_call(&self.http, Method::POST, &url, Some(&capabilities)).await?;
        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| SurfaceError::Fault("session response without sessionId".to_string()))?
            .to_string();

        tracing::info!(binary, session_id = %session_id, "started browser session");
        Ok(WebDriverSurface {
            http: self.http.clone(),
            driver_url: self.settings.webdriver_url.clone(),
            session_id,
        })
    }
}

#[async_trait]
impl SurfaceFactory for WebDriverSurfaceFactory {
    /// Try each configured browser binary in order, the same plug-and-play
    /// fallback the kiosks need across amd64 and arm images.
    async fn create(&self) -> Result<Box<dyn RenderedSurface>, SurfaceError> {
        let mut last_error =
            SurfaceError::Fault("no browser binaries configured".to_string());
        for binary in &self.settings.browser_binaries {
            match self.new_session(binary).await {
                Ok(surface) => return Ok(Box::new(surface)),
                Err(e) => {
                    tracing::warn!(binary = %binary, error = %e, "could not start browser");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

async fn wire_call(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<&Value>,
) -> Result<Value, SurfaceError> {
    let mut request = http.request(method, url).timeout(WIRE_TIMEOUT);
    if let Some(body) = body {
        request = request.json(body);
    }
    let response = request
        .send()
        .await
        .map_err(|e| SurfaceError::Fault(format!("webdriver transport: {e}")))?;

    let status = response.status();
    let mut payload: Value = response
        .json()
        .await
        .map_err(|e| SurfaceError::Fault(format!("webdriver payload: {e}")))?;

    if !status.is_success() {
        return Err(classify_wire_error(&payload));
    }
    Ok(payload["value"].take())
}

/// Element-level misses are transient and retried or skipped by the caller;
/// everything else means the session itself is in trouble.
fn classify_wire_error(payload: &Value) -> SurfaceError {
    let code = payload["value"]["error"].as_str().unwrap_or("unknown error");
    let message = payload["value"]["message"]
        .as_str()
        .filter(|m| !m.is_empty())
        .unwrap_or(code)
        .to_string();
    match code {
        "no such element" | "timeout" | "element not interactable" | "element click intercepted"
        | "stale element reference" => SurfaceError::Transient(message),
        _ => SurfaceError::Fault(message),
    }
}

fn as_fault(error: SurfaceError) -> SurfaceError {
    match error {
        SurfaceError::Transient(message) | SurfaceError::Fault(message) => {
            SurfaceError::Fault(message)
        }
    }
}
