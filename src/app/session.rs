// relayctl - app/session.rs
//
// Login, logout and the local identity summary.
//
// Login validates the key against the service before anything is written:
// a failed login leaves the store exactly as it was.

use crate::app::api_client::{ApiClient, ClientSettings};
use crate::app::profile_store::ProfileStore;
use crate::core::filter;
use crate::core::model::ConfigRecord;
use crate::util::error::{ConfigError, Result};
use serde::Serialize;

/// Credentials and target for a login.
#[derive(Clone)]
pub struct LoginRequest {
    /// Profile to create or refresh.
    pub profile: String,
    /// Email to record; the service's value is used when empty.
    pub email: String,
    pub api_key: String,
    pub api_url: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("profile", &self.profile)
            .field("email", &self.email)
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Validate `request.api_key` with the service, then save and activate the
/// profile.
///
/// Endpoints and the current environment of an existing profile with the
/// same name are kept; identity fields are replaced by what the service
/// reports.
pub async fn login(
    store: &ProfileStore,
    request: LoginRequest,
    settings: &ClientSettings,
) -> Result<ConfigRecord> {
    filter::validate_profile_name(&request.profile).map_err(|e| ConfigError::InvalidValue {
        field: "profile name",
        value: request.profile.clone(),
        expected: e.to_string(),
    })?;
    filter::validate_endpoint_url(&request.api_url)?;

    let mut candidate = ConfigRecord::new(request.profile.as_str());
    candidate.api_key = Some(request.api_key.trim().to_string());
    candidate.api_url = request.api_url.trim_end_matches('/').to_string();
    candidate.email = request.email.trim().to_string();

    tracing::info!(profile = %request.profile, api_url = %candidate.api_url, "Validating credentials");
    let client = ApiClient::new(&candidate, settings)?;
    let user = client.get_user_info().await?;

    candidate.user_id = user.id;
    candidate.user_name = user.name;
    candidate.permanent_url = user.permanent_url;
    if candidate.email.is_empty() {
        candidate.email = user.email.unwrap_or_default();
    }

    if store.exists(&request.profile) {
        let previous = store.load(&request.profile)?;
        candidate.endpoints = previous.endpoints;
        candidate.current_environment = previous.current_environment;
    }

    store.save(&request.profile, &candidate)?;
    store.switch_active(&request.profile)?;

    tracing::info!(
        profile = %request.profile,
        user_id = %candidate.user_id,
        "Logged in"
    );
    Ok(candidate)
}

/// Forget every profile.
pub fn logout(store: &ProfileStore) -> Result<()> {
    store.clear()?;
    tracing::info!("Logged out");
    Ok(())
}

/// Identity of a profile, as shown by `whoami`. Never carries the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub profile: String,
    pub user_name: String,
    pub email: String,
    pub user_id: String,
    pub api_url: String,
    pub current_environment: Option<String>,
    pub permanent_url: Option<String>,
    pub has_credentials: bool,
}

/// Local summary of `record`. No network.
pub fn whoami(record: &ConfigRecord) -> Identity {
    Identity {
        profile: record.name.clone(),
        user_name: record.user_name.clone(),
        email: record.email.clone(),
        user_id: record.user_id.clone(),
        api_url: record.api_url.clone(),
        current_environment: record.current_environment.clone(),
        permanent_url: record.permanent_url.clone(),
        has_credentials: record.has_credentials(),
    }
}
