//! Request headers for store calls
//!
//! The service matches these names and formats exactly and silently rejects
//! requests that deviate, so every value here mirrors what a genuine store
//! client sends. Session headers are only emitted once the corresponding value
//! has been obtained.

use reqwest::header::{
    ACCEPT_LANGUAGE, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};

use crate::config::protocol;
use crate::device::DeviceContext;
use crate::errors::Result;
use crate::session::{SessionState, format_device_id};

pub const DFE_ENCODED_TARGETS: HeaderName = HeaderName::from_static("x-dfe-encoded-targets");
pub const DFE_CLIENT_ID: HeaderName = HeaderName::from_static("x-dfe-client-id");
pub const DFE_MCCMNC: HeaderName = HeaderName::from_static("x-dfe-mccmnc");
pub const DFE_NETWORK_TYPE: HeaderName = HeaderName::from_static("x-dfe-network-type");
pub const DFE_CONTENT_FILTERS: HeaderName = HeaderName::from_static("x-dfe-content-filters");
pub const DFE_REQUEST_PARAMS: HeaderName = HeaderName::from_static("x-dfe-request-params");
pub const DFE_ENABLED_EXPERIMENTS: HeaderName =
    HeaderName::from_static("x-dfe-enabled-experiments");
pub const DFE_UNSUPPORTED_EXPERIMENTS: HeaderName =
    HeaderName::from_static("x-dfe-unsupported-experiments");
pub const DFE_SMALLEST_SCREEN_WIDTH_DP: HeaderName =
    HeaderName::from_static("x-dfe-smallestscreenwidthdp");
pub const DFE_FILTER_LEVEL: HeaderName = HeaderName::from_static("x-dfe-filter-level");
pub const DFE_DEVICE_ID: HeaderName = HeaderName::from_static("x-dfe-device-id");
pub const DFE_DEVICE_CONFIG_TOKEN: HeaderName =
    HeaderName::from_static("x-dfe-device-config-token");
pub const DFE_CHECKIN_CONSISTENCY_TOKEN: HeaderName =
    HeaderName::from_static("x-dfe-device-checkin-consistency-token");
pub const DFE_COOKIE: HeaderName = HeaderName::from_static("x-dfe-cookie");
/// Hex device id header of the auth endpoint
pub const DEVICE: HeaderName = HeaderName::from_static("device");
pub const APP: HeaderName = HeaderName::from_static("app");

/// What the headers are for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPurpose {
    /// Checkin and ordinary store operations
    #[default]
    Standard,
    /// Device configuration upload, which adds experiment and screen hints
    DeviceUpload,
}

/// Merge base device headers with whatever session values are known
pub fn build_headers(
    device: &DeviceContext,
    dfe_targets: &str,
    state: &SessionState,
    purpose: HeaderPurpose,
) -> Result<HeaderMap> {
    let mut headers = base_headers(device, dfe_targets)?;

    if purpose == HeaderPurpose::DeviceUpload {
        headers.insert(
            DFE_ENABLED_EXPERIMENTS,
            HeaderValue::from_static(protocol::ENABLED_EXPERIMENTS),
        );
        headers.insert(
            DFE_UNSUPPORTED_EXPERIMENTS,
            HeaderValue::from_static(protocol::UNSUPPORTED_EXPERIMENTS),
        );
        headers.insert(DFE_SMALLEST_SCREEN_WIDTH_DP, HeaderValue::from_static("240"));
        headers.insert(DFE_FILTER_LEVEL, HeaderValue::from_static("3"));
    }

    if let Some(device_id) = state.device_id {
        headers.insert(DFE_DEVICE_ID, HeaderValue::from_str(&format_device_id(device_id))?);
    }
    if let Some(token) = &state.auth_sub_token {
        let mut value = HeaderValue::from_str(&format!("GoogleLogin auth={}", token))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    if let Some(token) = &state.device_config_token {
        headers.insert(DFE_DEVICE_CONFIG_TOKEN, HeaderValue::from_str(token)?);
    }
    if let Some(token) = &state.checkin_consistency_token {
        headers.insert(DFE_CHECKIN_CONSISTENCY_TOKEN, HeaderValue::from_str(token)?);
    }
    if let Some(cookie) = &state.dfe_cookie {
        headers.insert(DFE_COOKIE, HeaderValue::from_str(cookie)?);
    }

    Ok(headers)
}

fn base_headers(device: &DeviceContext, dfe_targets: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&device.locale().replace('_', "-"))?,
    );
    headers.insert(DFE_ENCODED_TARGETS, HeaderValue::from_str(dfe_targets)?);
    headers.insert(USER_AGENT, HeaderValue::from_str(&device.user_agent())?);
    headers.insert(DFE_CLIENT_ID, HeaderValue::from_static(protocol::DFE_CLIENT_ID));
    headers.insert(
        DFE_MCCMNC,
        HeaderValue::from_str(&device.profile().cell_operator)?,
    );
    headers.insert(DFE_NETWORK_TYPE, HeaderValue::from_static("4"));
    headers.insert(DFE_CONTENT_FILTERS, HeaderValue::from_static(""));
    headers.insert(DFE_REQUEST_PARAMS, HeaderValue::from_static("timeoutMs=4000"));
    Ok(headers)
}

/// Headers for calls to the auth endpoint once the device id is known
pub fn auth_headers(device: &DeviceContext, device_id: Option<u64>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_str(&device.auth_user_agent())?);
    if let Some(id) = device_id {
        headers.insert(DEVICE, HeaderValue::from_str(&format_device_id(id))?);
    }
    Ok(headers)
}
