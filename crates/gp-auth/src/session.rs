use serde::{Deserialize, Serialize};

/// Progress of the session negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    /// AC2DM token obtained for the submitted credentials
    CredentialsSubmitted,
    /// Checkin done, server-assigned device id known
    DeviceRegistered,
    MasterTokenObtained,
    SessionEstablished,
    /// Resumed from a stored device id and sub-token, no network involved
    SessionRestored,
}

impl SessionPhase {
    /// Whether authenticated requests may be issued
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::SessionEstablished | Self::SessionRestored)
    }
}

/// Server-assigned session values
///
/// Only the session negotiator writes these; header construction reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub device_id: Option<u64>,
    pub auth_sub_token: Option<String>,
    pub security_token: Option<u64>,
    pub checkin_consistency_token: Option<String>,
    pub device_config_token: Option<String>,
    /// Session cookie from the table of contents
    pub dfe_cookie: Option<String>,
}

impl SessionState {
    /// Durable part of the session, once both halves are known
    pub fn credentials(&self) -> Option<SessionCredentials> {
        Some(SessionCredentials {
            device_id: self.device_id?,
            auth_sub_token: self.auth_sub_token.clone()?,
        })
    }
}

/// Device id and auth sub-token: all a later process needs to resume a session
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionCredentials {
    pub device_id: u64,
    pub auth_sub_token: String,
}

impl SessionCredentials {
    /// Device id as the service expects it in headers
    pub fn device_id_hex(&self) -> String {
        format_device_id(self.device_id)
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("device_id", &self.device_id_hex())
            .field("auth_sub_token", &"[REDACTED]")
            .finish()
    }
}

/// Lowercase hex without a `0x` prefix
pub fn format_device_id(device_id: u64) -> String {
    format!("{:x}", device_id)
}

/// Parse a device id rendered by [`format_device_id`]
pub fn parse_device_id(hex: &str) -> Option<u64> {
    let hex = hex.trim();
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    u64::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_device_id() {
        assert_eq!(format_device_id(0x3A5F_0000_1234_ABCD), "3a5f00001234abcd");
        assert_eq!(format_device_id(255), "ff");
        assert_eq!(parse_device_id("3a5f00001234abcd"), Some(0x3a5f_0000_1234_abcd));
        assert_eq!(parse_device_id("0xff"), Some(255));
        assert_eq!(parse_device_id("xyz"), None);
    }

    #[test]
    fn test_credentials_need_both_halves() {
        let mut state = SessionState {
            device_id: Some(1),
            ..Default::default()
        };
        assert!(state.credentials().is_none());

        state.auth_sub_token = Some("secret-sub-token".to_string());
        let creds = state.credentials().unwrap();
        assert_eq!(creds.device_id, 1);
        assert!(!format!("{:?}", creds).contains("secret-sub-token"));
    }

    #[test]
    fn test_phase_readiness() {
        assert!(!SessionPhase::default().is_ready());
        assert!(!SessionPhase::MasterTokenObtained.is_ready());
        assert!(SessionPhase::SessionEstablished.is_ready());
        assert!(SessionPhase::SessionRestored.is_ready());
    }
}
