use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Store-assigned identifier. Rendered as a string in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A record together with the identifier the store gave it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: RecordId,
    pub record: T,
}

// ── Records ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatKind {
    Visit,
    Download,
    SuccessfulDownload,
}

impl StatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Visit => "visit",
            StatKind::Download => "download",
            StatKind::SuccessfulDownload => "successful_download",
        }
    }
}

impl std::fmt::Display for StatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page-view ping. `page` is `None` when the client sent `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitRecord {
    pub page: Option<String>,
    pub timestamp: DateTime<Local>,
    pub ip_address: String,
    pub user_agent: String,
}

/// The two download shapes share the stats collection with visits.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadRecord {
    Attempted {
        url: Option<String>,
        timestamp: DateTime<Local>,
        ip_address: String,
    },
    Succeeded {
        timestamp: DateTime<Local>,
        ip_address: String,
    },
}

impl DownloadRecord {
    pub fn status(&self) -> &'static str {
        match self {
            DownloadRecord::Attempted { .. } => "attempted",
            DownloadRecord::Succeeded { .. } => "success",
        }
    }
}

/// Everything stored in the stats collection.
#[derive(Debug, Clone, PartialEq)]
pub enum StatRecord {
    Visit(VisitRecord),
    Download(DownloadRecord),
}

impl StatRecord {
    pub fn kind(&self) -> StatKind {
        match self {
            StatRecord::Visit(_) => StatKind::Visit,
            StatRecord::Download(DownloadRecord::Attempted { .. }) => StatKind::Download,
            StatRecord::Download(DownloadRecord::Succeeded { .. }) => StatKind::SuccessfulDownload,
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        match self {
            StatRecord::Visit(v) => v.timestamp,
            StatRecord::Download(DownloadRecord::Attempted { timestamp, .. })
            | StatRecord::Download(DownloadRecord::Succeeded { timestamp, .. }) => *timestamp,
        }
    }

    pub fn page(&self) -> Option<&str> {
        match self {
            StatRecord::Visit(v) => v.page.as_deref(),
            StatRecord::Download(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub action_text: Option<String>,
    pub action_url: Option<String>,
    pub timestamp: DateTime<Local>,
    pub active: bool,
    pub sent_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub action: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Local>,
    pub ip_address: String,
}

// ── Request bodies ──

/// Page recorded when the client omits the field.
pub const DEFAULT_PAGE: &str = "user";

/// Accept any JSON value where text is expected. `null` becomes `None`, a
/// string is taken as is and anything else is kept as its JSON text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn default_page() -> Option<String> {
    Some(DEFAULT_PAGE.to_string())
}

#[derive(Debug, Deserialize)]
pub struct TrackVisitRequest {
    /// Absent defaults to [`DEFAULT_PAGE`]; an explicit `null` is kept.
    #[serde(default = "default_page", deserialize_with = "lenient_text")]
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackDownloadRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
}

/// `message` is optional at parse time so the handler can run the
/// deactivation write before rejecting a body without one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub action_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub action_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackActivityRequest {
    pub action: String,
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub token: Option<String>,
}

// ── Responses ──

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self { status: "success" }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub token: &'static str,
}

/// Public view of the active notification.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub message: String,
    pub action_text: Option<String>,
    pub action_url: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl From<Notification> for NotificationView {
    fn from(n: Notification) -> Self {
        Self {
            message: n.message,
            action_text: n.action_text,
            action_url: n.action_url,
            timestamp: n.timestamp,
        }
    }
}

/// Activity log entry as returned to the dashboard.
#[derive(Debug, Serialize)]
pub struct ActivityView {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub record: ActivityRecord,
}

impl From<Stored<ActivityRecord>> for ActivityView {
    fn from(stored: Stored<ActivityRecord>) -> Self {
        Self {
            id: stored.id,
            record: stored.record,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_visits: u64,
    pub today_visits: u64,
    pub total_downloads: u64,
    pub successful_downloads: u64,
    pub visits_data: VisitSeries,
}

/// Daily visit counts, oldest first.
#[derive(Debug, Serialize, PartialEq)]
pub struct VisitSeries {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Local>,
    pub database: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn visit(body: serde_json::Value) -> TrackVisitRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_visit_page_absent_null_and_non_string() {
        assert_eq!(visit(json!({})).page.as_deref(), Some("user"));
        assert_eq!(visit(json!({ "page": "faq" })).page.as_deref(), Some("faq"));
        assert_eq!(visit(json!({ "page": null })).page, None);
        assert_eq!(visit(json!({ "page": 5 })).page.as_deref(), Some("5"));
        assert_eq!(
            visit(json!({ "page": ["user"] })).page.as_deref(),
            Some(r#"["user"]"#)
        );
    }

    #[test]
    fn test_notification_body_without_message_still_parses() {
        let req: SendNotificationRequest =
            serde_json::from_value(json!({ "actionText": "Go", "actionUrl": null })).unwrap();
        assert_eq!(req.message, None);
        assert_eq!(req.action_text.as_deref(), Some("Go"));
        assert_eq!(req.action_url, None);
    }

    #[test]
    fn test_login_fields_tolerate_null_and_numbers() {
        let req: LoginRequest =
            serde_json::from_value(json!({ "username": null, "password": 1234 })).unwrap();
        assert_eq!(req.username, None);
        assert_eq!(req.password.as_deref(), Some("1234"));

        let req: VerifyRequest = serde_json::from_value(json!({ "token": 7 })).unwrap();
        assert_eq!(req.token.as_deref(), Some("7"));
    }
}
