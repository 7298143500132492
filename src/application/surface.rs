// Rendered surface capability - the seam between the supervisor and the browser layer
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    /// Element not found or not interactable within its wait window.
    /// Swallowed during cosmetic steps, never restarts the session.
    #[error("transient ui fault: {0}")]
    Transient(String),
    /// Navigation, login or session-level failure. Drives recovery.
    #[error("surface fault: {0}")]
    Fault(String),
}

/// Named UI actions the supervisor can request without knowing the DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceAction {
    EnterFullscreen,
    OpenMenu,
    SetAutoRefresh(u32),
    CollapseFilters,
    ClearTooltips,
}

impl fmt::Display for SurfaceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceAction::EnterFullscreen => write!(f, "enter fullscreen"),
            SurfaceAction::OpenMenu => write!(f, "open menu"),
            SurfaceAction::SetAutoRefresh(minutes) => {
                write!(f, "set auto-refresh to {minutes} minutes")
            }
            SurfaceAction::CollapseFilters => write!(f, "collapse filter bar"),
            SurfaceAction::ClearTooltips => write!(f, "clear tooltips"),
        }
    }
}

/// Whatever actually renders the portal. The supervisor is the exclusive
/// owner of a handle; once a handle is torn down it is never reused.
#[async_trait]
pub trait RenderedSurface: Send {
    async fn open(&mut self, url: &str) -> Result<(), SurfaceError>;
    async fn login(&mut self, username: &str, password: &str) -> Result<(), SurfaceError>;
    async fn current_title(&mut self) -> Result<String, SurfaceError>;
    async fn perform(&mut self, action: SurfaceAction) -> Result<(), SurfaceError>;
    /// Best-effort release; a surface that is already gone is fine.
    async fn teardown(&mut self);
}

/// Creates fresh surfaces during recovery cycles.
#[async_trait]
pub trait SurfaceFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn RenderedSurface>, SurfaceError>;
}
