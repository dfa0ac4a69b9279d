// Async HTTP client for the fleet tracking server REST API.
//
// Base path: {server}/api/
// Auth: bearer token (see `TransportConfig`) or a pre-configured client.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{Device, EventRecord, EventsQuery, Position, SummaryQuery, SummaryRecord, User};

/// Async client for the tracking server.
///
/// All endpoints return JSON arrays or objects without an envelope; a
/// non-success status carries a plain-text message in the body.
#[derive(Debug, Clone)]
pub struct FleetClient {
    http: reqwest::Client,
    base_url: Url,
}

impl FleetClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a server URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The server root this client talks to (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ensure the base path ends with a slash so relative joins keep any
    /// reverse-proxy prefix (e.g. `https://host/tracker/`).
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url)
            .query(params)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = if raw.trim().is_empty() {
            status.to_string()
        } else {
            raw.trim().to_owned()
        };

        match status {
            reqwest::StatusCode::UNAUTHORIZED => Error::Authentication { message },
            reqwest::StatusCode::FORBIDDEN => Error::Forbidden { message },
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Session & users ──────────────────────────────────────────────

    /// The user bound to the current credentials.
    ///
    /// `GET /api/session`
    pub async fn session(&self) -> Result<User, Error> {
        self.get("api/session").await
    }

    /// Replace a user object and return the server's copy.
    ///
    /// `PUT /api/users/{id}`
    pub async fn update_user(&self, user: &User) -> Result<User, Error> {
        debug!(user_id = user.id, "updating user");
        self.put(&format!("api/users/{}", user.id), user).await
    }

    // ── Roster ───────────────────────────────────────────────────────

    /// `GET /api/devices`
    pub async fn devices(&self) -> Result<Vec<Device>, Error> {
        self.get("api/devices").await
    }

    /// Latest known position of every accessible device.
    ///
    /// `GET /api/positions`
    pub async fn positions(&self) -> Result<Vec<Position>, Error> {
        self.get("api/positions").await
    }

    // ── Reports ──────────────────────────────────────────────────────

    /// `GET /api/reports/summary?from&to&daily&deviceId=...`
    pub async fn summary(&self, query: &SummaryQuery) -> Result<Vec<SummaryRecord>, Error> {
        debug!(
            devices = query.device_ids.len(),
            daily = query.daily,
            "requesting summary report"
        );
        self.get_with_params("api/reports/summary", &query.params())
            .await
    }

    /// `GET /api/reports/events?from&to[&type]`
    pub async fn events(&self, query: &EventsQuery) -> Result<Vec<EventRecord>, Error> {
        debug!(event_type = ?query.event_type, "requesting events report");
        self.get_with_params("api/reports/events", &query.params())
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = FleetClient::from_reqwest("https://fleet.example.com/tracker", reqwest::Client::new())
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://fleet.example.com/tracker/");
        assert_eq!(
            client.url("api/session").unwrap().as_str(),
            "https://fleet.example.com/tracker/api/session"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = FleetClient::from_reqwest("not a url", reqwest::Client::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
