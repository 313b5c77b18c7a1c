use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tokio::sync::Mutex;

const COOKIE_URL: &str = "https://fc.yahoo.com/";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

/// How long a crumb/cookie pair stays valid before it is refreshed.
const SESSION_TTL_MINUTES: i64 = 30;

/// An API crumb plus the session cookie it was issued against.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub crumb: String,
    pub cookie: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn is_fresh(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

/// TTL cache for the chart API session. The mutex is held across the refresh
/// round-trip so concurrent callers observe exactly one refresh per expiry.
pub(crate) struct SessionCache {
    inner: Mutex<Option<Session>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self { inner: Mutex::new(None) }
    }

    /// Return the cached session, refreshing it first if missing or expired.
    /// A failed refresh yields None; chart requests then go out without a
    /// crumb, which the provider accepts for index symbols.
    pub async fn get(&self, http: &Client) -> Option<Session> {
        let mut slot = self.inner.lock().await;
        if let Some(session) = slot.as_ref() {
            if session.is_fresh() {
                return Some(session.clone());
            }
        }

        match refresh(http).await {
            Some(session) => {
                tracing::debug!("Refreshed chart API session (crumb {} chars)", session.crumb.len());
                *slot = Some(session.clone());
                Some(session)
            }
            None => {
                tracing::warn!("Chart API session refresh failed, continuing without crumb");
                *slot = None;
                None
            }
        }
    }
}

/// Two-step handshake: the bootstrap endpoint sets the session cookie, the
/// crumb endpoint echoes the matching crumb.
async fn refresh(http: &Client) -> Option<Session> {
    let bootstrap = http.get(COOKIE_URL).send().await.ok()?;
    let cookie = bootstrap
        .headers()
        .get(reqwest::header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()?
        .to_string();

    let crumb = http
        .get(CRUMB_URL)
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .ok()?
        .text()
        .await
        .ok()?;

    if crumb.is_empty() || crumb.contains('{') {
        return None;
    }

    Some(Session {
        crumb,
        cookie,
        expires_at: Utc::now() + Duration::minutes(SESSION_TTL_MINUTES),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_freshness() {
        let fresh = Session {
            crumb: "abc".into(),
            cookie: "A1=x".into(),
            expires_at: Utc::now() + Duration::minutes(5),
        };
        assert!(fresh.is_fresh());

        let stale = Session {
            expires_at: Utc::now() - Duration::seconds(1),
            ..fresh
        };
        assert!(!stale.is_fresh());
    }
}
