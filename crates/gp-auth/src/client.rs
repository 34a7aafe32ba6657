use std::collections::HashMap;
use std::sync::Arc;

use gp_proto::{
    AndroidCheckinRequest, AndroidCheckinResponse, CONTENT_TYPE_PROTO, ResponseWrapper,
    UploadDeviceConfigRequest,
};
use prost::Message;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::checkin::{build_checkin_request, build_checkin_update, device_configuration};
use crate::config::{ProtocolConfig, protocol};
use crate::crypto::{EncryptedCredential, encrypt_credentials};
use crate::device::DeviceContext;
use crate::errors::{GpAuthError, Result};
use crate::form::{FormParams, parse_key_values};
use crate::headers::{self, HeaderPurpose};
use crate::session::{SessionCredentials, SessionPhase, SessionState, format_device_id};

/// Marker the auth endpoint puts in `Error` when it wants a browser sign-in
const NEEDS_BROWSER: &str = "NeedsBrowser";

/// How a session should be obtained
#[derive(Clone)]
pub enum LoginRequest {
    /// Full handshake with account credentials
    Password { email: String, password: String },
    /// Resume a previously negotiated session without network calls
    Restore(SessionCredentials),
}

impl LoginRequest {
    /// Pick the login path from optional inputs, as a command line would supply them
    pub fn from_parts(
        email: Option<String>,
        password: Option<String>,
        device_id: Option<u64>,
        auth_sub_token: Option<String>,
    ) -> Result<Self> {
        match (email, password, device_id, auth_sub_token) {
            (Some(email), Some(password), _, _) => Ok(Self::Password { email, password }),
            (_, _, Some(device_id), Some(auth_sub_token)) => {
                Ok(Self::Restore(SessionCredentials {
                    device_id,
                    auth_sub_token,
                }))
            }
            _ => Err(GpAuthError::Login(
                "Either (email, password) or (device id, auth sub-token) is needed".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .finish_non_exhaustive(),
            Self::Restore(credentials) => f.debug_tuple("Restore").field(credentials).finish(),
        }
    }
}

/// Session negotiator for one virtual device
///
/// Drives the handshake: credential encryption, AC2DM token, two checkins,
/// master token, sub-token exchange and device-config upload. Each step needs
/// the previous step's output, so calls are strictly sequential. Any failure
/// resets the client to [`SessionPhase::Uninitialized`].
#[derive(Clone)]
pub struct GpAuthClient {
    config: Arc<ProtocolConfig>,
    device: DeviceContext,
    http: Client,
    state: SessionState,
    phase: SessionPhase,
}

impl GpAuthClient {
    /// Create a new client for a device
    pub fn new(config: Arc<ProtocolConfig>, device: DeviceContext) -> Result<Self> {
        let http = config.http_client()?;
        Ok(Self {
            config,
            device,
            http,
            state: SessionState::default(),
            phase: SessionPhase::Uninitialized,
        })
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn device(&self) -> &DeviceContext {
        &self.device
    }

    /// Shared HTTP client, for store operations built on this session
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Device id and sub-token once the session is usable
    pub fn credentials(&self) -> Option<SessionCredentials> {
        if self.phase.is_ready() {
            self.state.credentials()
        } else {
            None
        }
    }

    /// Remember the session cookie handed out by the table of contents
    pub fn set_dfe_cookie(&mut self, cookie: impl Into<String>) {
        self.state.dfe_cookie = Some(cookie.into());
    }

    /// Headers for the given purpose with every session value known so far
    pub fn headers(&self, purpose: HeaderPurpose) -> Result<HeaderMap> {
        headers::build_headers(&self.device, &self.config.dfe_targets, &self.state, purpose)
    }

    /// Headers for an authenticated store request
    ///
    /// Fails before any I/O when no sub-token has been obtained.
    pub fn authorized_headers(&self) -> Result<HeaderMap> {
        if self.state.auth_sub_token.is_none() {
            return Err(GpAuthError::Login(
                "You need to login before executing any request".to_string(),
            ));
        }
        self.headers(HeaderPurpose::Standard)
    }

    /// Obtain a session by either path of [`LoginRequest`]
    pub async fn authenticate(&mut self, request: LoginRequest) -> Result<SessionCredentials> {
        match request {
            LoginRequest::Password { email, password } => self.login(&email, &password).await,
            LoginRequest::Restore(credentials) => {
                self.restore(credentials.clone());
                Ok(credentials)
            }
        }
    }

    /// Run the full handshake with account credentials
    #[instrument(skip(self, email, password), fields(device = %self.device.profile().name))]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<SessionCredentials> {
        debug!("Starting login handshake");
        self.reset();

        match self.negotiate(email, password).await {
            Ok(credentials) => Ok(credentials),
            Err(e) => {
                debug!("Login aborted in phase {:?}: {}", self.phase, e);
                self.reset();
                Err(e)
            }
        }
    }

    /// Resume a session from a stored device id and sub-token
    ///
    /// The token is not checked; a stale one surfaces on the first store request.
    pub fn restore(&mut self, credentials: SessionCredentials) {
        debug!("Restoring session for device {}", credentials.device_id_hex());
        self.state = SessionState {
            device_id: Some(credentials.device_id),
            auth_sub_token: Some(credentials.auth_sub_token),
            ..Default::default()
        };
        self.phase = SessionPhase::SessionRestored;
    }

    fn reset(&mut self) {
        self.state = SessionState::default();
        self.phase = SessionPhase::Uninitialized;
    }

    async fn negotiate(&mut self, email: &str, password: &str) -> Result<SessionCredentials> {
        // Step 1: Encrypt credentials under the server key
        let encrypted = encrypt_credentials(email, password, &self.config.server_public_key)?;

        // Step 2: AC2DM token
        let ac2dm_token = self.request_ac2dm_token(email, &encrypted).await?;
        self.phase = SessionPhase::CredentialsSubmitted;

        // Step 3: Register the device (two checkins)
        let device_id = self.checkin(email, &ac2dm_token).await?;
        self.state.device_id = Some(device_id);
        self.phase = SessionPhase::DeviceRegistered;

        // Step 4: Master token
        let (master_token, params) = self
            .request_master_token(email, &encrypted, device_id)
            .await?;
        self.phase = SessionPhase::MasterTokenObtained;

        // Step 5: Durable sub-token
        let auth_sub_token = self
            .request_sub_token(&master_token, params, device_id)
            .await?;
        self.state.auth_sub_token = Some(auth_sub_token.clone());

        // Step 6: Device configuration
        self.upload_device_config().await?;
        self.phase = SessionPhase::SessionEstablished;

        debug!("Session established for device {}", format_device_id(device_id));
        Ok(SessionCredentials {
            device_id,
            auth_sub_token,
        })
    }

    /// Fixed login form a genuine account manager submits
    fn login_params(&self, email: &str, encrypted: &EncryptedCredential) -> FormParams {
        let profile = self.device.profile();
        let mut params = FormParams::new();
        params
            .set("Email", email)
            .set("EncryptedPasswd", encrypted.as_str())
            .set("add_account", "1")
            .set("accountType", protocol::ACCOUNT_TYPE)
            .set("google_play_services_version", profile.gsf_version.to_string())
            .set("has_permission", "1")
            .set("source", "android")
            .set("device_country", self.device.country())
            .set("lang", self.device.locale())
            .set("client_sig", protocol::CLIENT_SIG)
            .set("callerSig", protocol::CLIENT_SIG)
            .set("droidguard_results", "dummy123");
        params
    }

    /// Exchange encrypted credentials for an AC2DM token
    #[instrument(skip_all)]
    async fn request_ac2dm_token(
        &self,
        email: &str,
        encrypted: &EncryptedCredential,
    ) -> Result<String> {
        let mut params = self.login_params(email, encrypted);
        params
            .set("service", "ac2dm")
            .set("add_account", "1")
            .set("callerPkg", protocol::GMS_PACKAGE);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(protocol::AUTH_USER_AGENT));

        debug!("Requesting AC2DM token");
        let response = self.post_auth(&params, headers).await?;
        ac2dm_token_from(&response)
    }

    /// Submit the device record twice and return the server-assigned device id
    #[instrument(skip_all)]
    async fn checkin(&mut self, email: &str, ac2dm_token: &str) -> Result<u64> {
        let mut headers = self.headers(HeaderPurpose::Standard)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_PROTO));

        let request = build_checkin_request(&self.device);

        debug!("Submitting initial checkin");
        let body = self
            .post_proto(&self.config.endpoints.checkin, &request, headers.clone())
            .await?;
        let response = AndroidCheckinResponse::decode(body.as_slice())?;

        let device_id = response
            .android_id
            .filter(|id| *id != 0)
            .ok_or_else(|| GpAuthError::Login("Checkin did not assign a device id".to_string()))?;
        let security_token = response.security_token.unwrap_or_default();
        self.state.security_token = Some(security_token);
        self.state.checkin_consistency_token = response.device_checkin_consistency_token;

        let update: AndroidCheckinRequest =
            build_checkin_update(&request, email, ac2dm_token, device_id, security_token);

        debug!("Submitting checkin update for device {}", format_device_id(device_id));
        self.post_proto(&self.config.endpoints.checkin, &update, headers)
            .await?;

        Ok(device_id)
    }

    /// Ask for the store master token, returning it with the form used
    #[instrument(skip_all)]
    async fn request_master_token(
        &self,
        email: &str,
        encrypted: &EncryptedCredential,
        device_id: u64,
    ) -> Result<(String, FormParams)> {
        let mut params = self.login_params(email, encrypted);
        params
            .set("service", "androidmarket")
            .set("app", protocol::VENDING_APP);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(protocol::AUTH_USER_AGENT));
        headers.insert(
            headers::DEVICE,
            HeaderValue::from_str(&format_device_id(device_id))?,
        );

        debug!("Requesting master token");
        let response = self.post_auth(&params, headers).await?;
        let master_token = required_field(&response, "token")?;
        Ok((master_token, params))
    }

    /// Trade the master token for the durable auth sub-token
    #[instrument(skip_all)]
    async fn request_sub_token(
        &self,
        master_token: &str,
        mut params: FormParams,
        device_id: u64,
    ) -> Result<String> {
        params
            .set("androidId", format_device_id(device_id))
            .set("Token", master_token)
            .set("check_email", "1")
            .set("token_request_options", protocol::TOKEN_REQUEST_OPTIONS)
            .set("system_partition", "1")
            .set("_opt_is_called_from_account_manager", "1");
        params.remove("Email");
        params.remove("EncryptedPasswd");

        let mut headers = headers::auth_headers(&self.device, Some(device_id))?;
        headers.insert(headers::APP, HeaderValue::from_static(protocol::VENDING_APP));

        debug!("Requesting auth sub-token");
        let response = self.post_auth(&params, headers).await?;
        required_field(&response, "auth")
    }

    /// Upload the device configuration and keep the config token if one comes back
    #[instrument(skip(self))]
    async fn upload_device_config(&mut self) -> Result<()> {
        let upload = UploadDeviceConfigRequest {
            device_configuration: Some(device_configuration(self.device.profile())),
            ..Default::default()
        };
        let mut headers = self.headers(HeaderPurpose::DeviceUpload)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_PROTO));

        debug!("Uploading device configuration");
        let body = self
            .post_proto(&self.config.endpoints.upload_device_config, &upload, headers)
            .await?;

        match ResponseWrapper::decode(body.as_slice()) {
            Ok(wrapper) => {
                let token = wrapper
                    .payload
                    .and_then(|p| p.upload_device_config_response)
                    .and_then(|r| r.upload_device_config_token);
                if token.is_none() {
                    debug!("Device config upload returned no token");
                }
                self.state.device_config_token = token;
            }
            Err(e) => warn!("Ignoring unreadable device config upload response: {}", e),
        }

        Ok(())
    }

    async fn post_auth(
        &self,
        params: &FormParams,
        headers: HeaderMap,
    ) -> Result<HashMap<String, String>> {
        let response = self
            .http
            .post(self.config.endpoints.auth.clone())
            .headers(headers)
            .form(params.fields())
            .send()
            .await?;

        // Error bodies carry the server's reason, so they are parsed like successes
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!("Auth endpoint answered {}", status);
        }
        Ok(parse_key_values(&body))
    }

    async fn post_proto<M: Message>(
        &self,
        url: &Url,
        message: &M,
        headers: HeaderMap,
    ) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(url.clone())
            .headers(headers)
            .body(message.encode_to_vec())
            .send()
            .await?;

        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl std::fmt::Debug for GpAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpAuthClient")
            .field("device", &self.device.profile().name)
            .field("locale", &self.device.locale())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

/// Turn a non-success response into [`GpAuthError::Http`]
pub async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    Err(GpAuthError::Http {
        status,
        body_snippet: String::from_utf8_lossy(&body).chars().take(200).collect(),
    })
}

/// Interpret the AC2DM response: token, security check, or login failure
fn ac2dm_token_from(response: &HashMap<String, String>) -> Result<String> {
    if let Some(token) = response.get("auth") {
        return Ok(token.clone());
    }

    match response.get("error") {
        Some(error) if error.contains(NEEDS_BROWSER) => Err(GpAuthError::SecurityCheck {
            error: error.clone(),
            callback_url: security_callback_url(response, error),
        }),
        Some(error) => Err(GpAuthError::Login(format!("server says: {}", error))),
        None => Err(GpAuthError::Login("Auth token not found".to_string())),
    }
}

/// Callback URL of a security check, from its own field or embedded in the error
fn security_callback_url(response: &HashMap<String, String>, error: &str) -> Option<String> {
    response.get("url").cloned().or_else(|| {
        error
            .split('&')
            .find_map(|part| part.strip_prefix("url="))
            .map(str::to_string)
    })
}

fn required_field(response: &HashMap<String, String>, key: &str) -> Result<String> {
    if let Some(value) = response.get(key) {
        return Ok(value.clone());
    }
    match response.get("error") {
        Some(error) => Err(GpAuthError::Login(format!("server says: {}", error))),
        None => Err(GpAuthError::Login(format!("{} token not found", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests::sample_profile;
    use gp_proto::{Payload, UploadDeviceConfigResponse};
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DEVICE_ID: u64 = 0x3a5f_0000_1234_abcd;
    const DEVICE_ID_HEX: &str = "3a5f00001234abcd";

    fn client_for(server: &MockServer) -> GpAuthClient {
        let base = format!("{}/", server.uri());
        let config = ProtocolConfig::with_base_urls(&base, &base).unwrap();
        let device = DeviceContext::new(sample_profile(), "en_US", None).unwrap();
        GpAuthClient::new(Arc::new(config), device).unwrap()
    }

    fn checkin_response() -> Vec<u8> {
        AndroidCheckinResponse {
            stats_ok: Some(true),
            android_id: Some(DEVICE_ID),
            security_token: Some(0x1122_3344_5566_7788),
            device_checkin_consistency_token: Some("consistency-token".to_string()),
            ..Default::default()
        }
        .encode_to_vec()
    }

    fn upload_response() -> Vec<u8> {
        ResponseWrapper {
            payload: Some(Payload {
                upload_device_config_response: Some(UploadDeviceConfigResponse {
                    upload_device_config_token: Some("config-token".to_string()),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
        .encode_to_vec()
    }

    async fn mount_ac2dm(server: &MockServer, body: &str) {
        Mock::given(method("POST"))
            .and(path("/auth"))
            .and(body_string_contains("service=ac2dm"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mount_checkin(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/checkin"))
            .and(header("content-type", CONTENT_TYPE_PROTO))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(checkin_response()))
            .expect(2)
            .mount(server)
            .await;
    }

    async fn mount_master_token(server: &MockServer, body: &str) {
        Mock::given(method("POST"))
            .and(path("/auth"))
            .and(body_string_contains("service=androidmarket"))
            .and(body_string_contains("EncryptedPasswd="))
            .and(header("device", DEVICE_ID_HEX))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mount_sub_token(server: &MockServer, body: &str) {
        Mock::given(method("POST"))
            .and(path("/auth"))
            .and(body_string_contains("check_email=1"))
            .and(body_string_contains(&format!("androidId={}", DEVICE_ID_HEX)))
            .and(body_string_contains("Token=master-token"))
            .and(header("app", "com.android.vending"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .with_priority(1)
            .mount(server)
            .await;
    }

    async fn mount_upload(server: &MockServer, body: Vec<u8>) {
        Mock::given(method("POST"))
            .and(path("/fdfe/uploadDeviceConfig"))
            .and(header("authorization", "GoogleLogin auth=sub-token"))
            .and(header("x-dfe-device-id", DEVICE_ID_HEX))
            .and(header("x-dfe-smallestscreenwidthdp", "240"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_full_login_handshake() {
        let server = MockServer::start().await;
        mount_ac2dm(&server, "SID=sid\nLSID=lsid\nAuth=ac2dm-token\n").await;
        mount_checkin(&server).await;
        mount_master_token(&server, "Token=master-token\nservices=android").await;
        mount_sub_token(&server, "Auth=sub-token\nExpiry=0").await;
        mount_upload(&server, upload_response()).await;

        let mut client = client_for(&server);
        let credentials = client.login("user@example.com", "pw").await.unwrap();

        assert_eq!(credentials.device_id, DEVICE_ID);
        assert_eq!(credentials.auth_sub_token, "sub-token");
        assert_eq!(client.phase(), SessionPhase::SessionEstablished);
        assert_eq!(client.credentials(), Some(credentials));

        let state = client.state();
        assert_eq!(state.checkin_consistency_token.as_deref(), Some("consistency-token"));
        assert_eq!(state.device_config_token.as_deref(), Some("config-token"));
        assert_eq!(state.security_token, Some(0x1122_3344_5566_7788));

        let headers = client.authorized_headers().unwrap();
        assert_eq!(headers[headers::DFE_DEVICE_ID], DEVICE_ID_HEX);
        assert_eq!(headers[headers::DFE_DEVICE_CONFIG_TOKEN], "config-token");
    }

    #[tokio::test]
    async fn test_second_checkin_carries_account_cookie() {
        let server = MockServer::start().await;
        mount_ac2dm(&server, "Auth=ac2dm-token").await;
        mount_checkin(&server).await;
        mount_master_token(&server, "Token=master-token").await;
        mount_sub_token(&server, "Auth=sub-token").await;
        mount_upload(&server, upload_response()).await;

        let mut client = client_for(&server);
        client.login("user@example.com", "pw").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let checkins: Vec<AndroidCheckinRequest> = requests
            .iter()
            .filter(|r| r.url.path() == "/checkin")
            .map(|r| AndroidCheckinRequest::decode(r.body.as_slice()).unwrap())
            .collect();

        assert_eq!(checkins.len(), 2);
        assert_eq!(checkins[0].id, Some(0));
        assert!(checkins[0].account_cookie.is_empty());
        assert_eq!(checkins[1].id, Some(DEVICE_ID as i64));
        assert_eq!(checkins[1].security_token, Some(0x1122_3344_5566_7788));
        assert_eq!(
            checkins[1].account_cookie,
            vec!["[user@example.com]", "ac2dm-token"]
        );

        let sub_token_request = requests
            .iter()
            .find(|r| String::from_utf8_lossy(&r.body).contains("check_email=1"))
            .unwrap();
        let body = String::from_utf8_lossy(&sub_token_request.body);
        assert!(!body.contains("Email="));
        assert!(!body.contains("EncryptedPasswd="));
        assert!(body.contains("token_request_options=CAA4AQ%3D%3D"));
    }

    #[tokio::test]
    async fn test_needs_browser_is_security_check() {
        let server = MockServer::start().await;
        mount_ac2dm(
            &server,
            "Error=NeedsBrowser\nUrl=https://example.com/verify\n",
        )
        .await;
        Mock::given(path("/checkin"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let err = client.login("user@example.com", "pw").await.unwrap_err();

        match &err {
            GpAuthError::SecurityCheck { callback_url, .. } => {
                assert_eq!(callback_url.as_deref(), Some("https://example.com/verify"));
            }
            other => panic!("expected security check, got {:?}", other),
        }
        assert!(err.to_string().contains("https://example.com/verify"));
        assert_eq!(client.phase(), SessionPhase::Uninitialized);
    }

    #[tokio::test]
    async fn test_needs_browser_with_embedded_url() {
        let server = MockServer::start().await;
        mount_ac2dm(&server, "error=NeedsBrowser&url=https://example.com/verify").await;

        let mut client = client_for(&server);
        let err = client.login("user@example.com", "pw").await.unwrap_err();

        assert!(err.requires_user_action());
        assert!(err.to_string().contains("https://example.com/verify"));
    }

    #[tokio::test]
    async fn test_bad_authentication_is_login_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Error=BadAuthentication"))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let err = client.login("user@example.com", "wrong").await.unwrap_err();

        assert!(matches!(&err, GpAuthError::Login(msg) if msg.contains("BadAuthentication")));
        assert!(err.is_credential_error());
    }

    #[tokio::test]
    async fn test_missing_ac2dm_token() {
        let server = MockServer::start().await;
        mount_ac2dm(&server, "SID=sid\nnothing useful").await;

        let mut client = client_for(&server);
        let err = client.login("user@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, GpAuthError::Login(msg) if msg.contains("not found")));
    }

    #[tokio::test]
    async fn test_failed_master_token_resets_session() {
        let server = MockServer::start().await;
        mount_ac2dm(&server, "Auth=ac2dm-token").await;
        mount_checkin(&server).await;
        mount_master_token(&server, "Error=ServiceDisabled").await;

        let mut client = client_for(&server);
        let err = client.login("user@example.com", "pw").await.unwrap_err();

        assert!(matches!(&err, GpAuthError::Login(msg) if msg.contains("ServiceDisabled")));
        assert_eq!(client.phase(), SessionPhase::Uninitialized);
        assert_eq!(client.state(), &SessionState::default());
        assert!(client.credentials().is_none());
    }

    #[tokio::test]
    async fn test_checkin_http_error_aborts() {
        let server = MockServer::start().await;
        mount_ac2dm(&server, "Auth=ac2dm-token").await;
        Mock::given(method("POST"))
            .and(path("/checkin"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let err = client.login("user@example.com", "pw").await.unwrap_err();

        assert!(matches!(&err, GpAuthError::Http { status, .. } if status.as_u16() == 500));
        assert!(err.is_transient());
        assert_eq!(client.phase(), SessionPhase::Uninitialized);
    }

    #[tokio::test]
    async fn test_unreadable_upload_response_is_tolerated() {
        let server = MockServer::start().await;
        mount_ac2dm(&server, "Auth=ac2dm-token").await;
        mount_checkin(&server).await;
        mount_master_token(&server, "Token=master-token").await;
        mount_sub_token(&server, "Auth=sub-token").await;
        mount_upload(&server, vec![0xff, 0xff, 0xff, 0xff]).await;

        let mut client = client_for(&server);
        let credentials = client.login("user@example.com", "pw").await.unwrap();

        assert_eq!(credentials.auth_sub_token, "sub-token");
        assert_eq!(client.phase(), SessionPhase::SessionEstablished);
        assert!(client.state().device_config_token.is_none());
    }

    #[tokio::test]
    async fn test_restore_skips_network() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut client = client_for(&server);
        let credentials = client
            .authenticate(LoginRequest::Restore(SessionCredentials {
                device_id: DEVICE_ID,
                auth_sub_token: "stored-token".to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(credentials.device_id, DEVICE_ID);
        assert_eq!(client.phase(), SessionPhase::SessionRestored);

        let headers = client.authorized_headers().unwrap();
        assert_eq!(headers[reqwest::header::AUTHORIZATION], "GoogleLogin auth=stored-token");
        assert_eq!(headers[headers::DFE_DEVICE_ID], DEVICE_ID_HEX);
    }

    #[tokio::test]
    async fn test_requests_rejected_before_login() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let err = client.authorized_headers().unwrap_err();
        assert!(matches!(err, GpAuthError::Login(msg) if msg.contains("login")));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_login_request_from_parts() {
        assert!(matches!(
            LoginRequest::from_parts(Some("a@b.c".into()), Some("pw".into()), None, None),
            Ok(LoginRequest::Password { .. })
        ));
        assert!(matches!(
            LoginRequest::from_parts(None, None, Some(1), Some("token".into())),
            Ok(LoginRequest::Restore(_))
        ));
        assert!(matches!(
            LoginRequest::from_parts(Some("a@b.c".into()), None, Some(1), None),
            Err(GpAuthError::Login(_))
        ));
    }

    #[test]
    fn test_ac2dm_interpretation() {
        let parsed = parse_key_values("Auth=abc");
        assert_eq!(ac2dm_token_from(&parsed).unwrap(), "abc");

        let parsed = parse_key_values("Error=NeedsBrowser");
        assert!(matches!(
            ac2dm_token_from(&parsed),
            Err(GpAuthError::SecurityCheck { callback_url: None, .. })
        ));
    }
}
