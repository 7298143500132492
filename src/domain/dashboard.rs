// Dashboard domain model

/// One entry in the rotation. Identity is the url; titles are only used
/// for the health check's substring match against the page title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSpec {
    pub title: String,
    pub url: String,
}

impl DashboardSpec {
    pub fn new(title: String, url: String) -> Self {
        Self { title, url }
    }
}
