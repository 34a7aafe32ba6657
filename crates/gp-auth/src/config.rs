use std::time::Duration;

use url::Url;

use crate::errors::Result;

/// Default store service endpoints
pub mod endpoints {
    pub const BASE: &str = "https://android.clients.google.com/";
    pub const PLAYSTORE_BASE: &str = "https://play-fe.googleapis.com/";

    pub const AUTH: &str = "auth";
    pub const CHECKIN: &str = "checkin";
    pub const FDFE: &str = "fdfe/";
    pub const UPLOAD_DEVICE_CONFIG: &str = "uploadDeviceConfig";
}

/// Fixed values the service expects from a genuine store client
pub mod protocol {
    /// Server RSA public key in the `len | modulus | len | exponent` layout
    pub const SERVER_PUBLIC_KEY: &str = "AAAAgMom/1a/v0lblO2Ubrt60J2gcuXSljGFQXgcyZWveWLEwo6prwgi3iJIZdodyhKZQrNWp5nKJ3srRXcUW+F1BD3baEVGcmEgqaLZUNBjm057pKRI16kB0YppeGx5qIQ5QjKzsR8ETQbKLNWgRY0QRNVz34kMJR3P/LgHax/6rmf5AAAAAwEAAQ==";

    pub const DFE_TARGETS: &str = "CAEScFfqlIEG6gUYogFWrAISK1WDAg+hAZoCDgIU1gYEOIACFkLMAeQBnASLATlASUuyAyqCAjY5igOMBQzfA/IClwFbApUC4ANbtgKVAS7OAX8YswHFBhgDwAOPAmGEBt4OfKkB5weSB5AFASkiN68akgMaxAMSAQEBA9kBO7UBFE1KVwIDBGs3go6BBgEBAgMECQgJAQIEAQMEAQMBBQEBBAUEFQYCBgUEAwMBDwIBAgOrARwBEwMEAg0mrwESfTEcAQEKG4EBMxghChMBDwYGASI3hAEODEwXCVh/EREZA4sBYwEdFAgIIwkQcGQRDzQ2fTC2AjfVAQIBAYoBGRg2FhYFBwEqNzACJShzFFblAo0CFxpFNBzaAd0DHjIRI4sBJZcBPdwBCQGhAUd2A7kBLBVPngEECHl0UEUMtQETigHMAgUFCc0BBUUlTywdHDgBiAJ+vgKhAU0uAcYCAWQ/5ALUAw1UwQHUBpIBCdQDhgL4AY4CBQICjARbGFBGWzA1CAEMOQH+BRAOCAZywAIDyQZ2MgM3BxsoAgUEBwcHFia3AgcGTBwHBYwBAlcBggFxSGgIrAEEBw4QEqUCASsWadsHCgUCBQMD7QICA3tXCUw7ugJZAwGyAUwpIwM5AwkDBQMJA5sBCw8BNxBVVBwVKhebARkBAwsQEAgEAhESAgQJEBCZATMdzgEBBwG8AQQYKSMUkAEDAwY/CTs4/wEaAUt1AwEDAQUBAgIEAwYEDx1dB2wGeBFgTQ";

    pub const ACCOUNT_TYPE: &str = "HOSTED_OR_GOOGLE";
    pub const CLIENT_SIG: &str = "38918a453d07199354f8b19af05ec6562ced5788";
    pub const AUTH_USER_AGENT: &str = "GoogleAuth/1.4";
    pub const VENDING_APP: &str = "com.android.vending";
    pub const GMS_PACKAGE: &str = "com.google.android.gms";
    pub const DFE_CLIENT_ID: &str = "am-android-google";
    pub const DEFAULT_VENDING_VERSION_STRING: &str = "8.4.19.V-all [0] [FP] 175058788";

    pub const ENABLED_EXPERIMENTS: &str = "cl:billing.select_add_instrument_by_default";
    pub const UNSUPPORTED_EXPERIMENTS: &str = "nocache:billing.use_charging_poller,\
        market_emails,buyer_currency,prod_baseline,checkin.set_asset_paid_app_field,\
        shekel_test,content_ratings,buyer_currency_in_app,nocache:encrypted_apk,recent_changes";

    /// Second-round token exchange flags
    pub const TOKEN_REQUEST_OPTIONS: &str = "CAA4AQ==";
}

/// Resolved endpoint URLs
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub auth: Url,
    pub checkin: Url,
    pub upload_device_config: Url,
    /// Base for store operations on the device-facing host
    pub fdfe: Url,
    /// Base for store operations on the play frontend host
    pub play_fdfe: Url,
}

impl Endpoints {
    /// Derive every endpoint from the two service hosts
    pub fn from_bases(base: &str, playstore_base: &str) -> Result<Self> {
        let base = Url::parse(base)?;
        let fdfe = base.join(endpoints::FDFE)?;
        Ok(Self {
            auth: base.join(endpoints::AUTH)?,
            checkin: base.join(endpoints::CHECKIN)?,
            upload_device_config: fdfe.join(endpoints::UPLOAD_DEVICE_CONFIG)?,
            fdfe,
            play_fdfe: Url::parse(playstore_base)?.join(endpoints::FDFE)?,
        })
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpTimeouts {
    pub connect: Duration,
    /// Upper bound for every call, token exchanges included
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(60),
        }
    }
}

/// TLS compatibility switches
///
/// The auth service answers `403 BadAuthentication` to handshakes that
/// negotiate ALPN, so the default leaves the ALPN list empty.
#[derive(Debug, Clone)]
pub struct TlsOptions {
    pub disable_alpn: bool,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self { disable_alpn: true }
    }
}

/// Process-wide protocol configuration
///
/// Built once and shared (usually behind an `Arc`) by every session.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    pub endpoints: Endpoints,
    /// Base64 server public key used to encrypt credentials
    pub server_public_key: String,
    pub dfe_targets: String,
    pub http_timeouts: HttpTimeouts,
    pub tls: TlsOptions,
}

impl ProtocolConfig {
    /// Configuration for the public store service
    pub fn new() -> Result<Self> {
        Self::with_base_urls(endpoints::BASE, endpoints::PLAYSTORE_BASE)
    }

    /// Point every endpoint at custom hosts (proxies, mock servers)
    pub fn with_base_urls(base: &str, playstore_base: &str) -> Result<Self> {
        Ok(Self {
            endpoints: Endpoints::from_bases(base, playstore_base)?,
            server_public_key: protocol::SERVER_PUBLIC_KEY.to_string(),
            dfe_targets: protocol::DFE_TARGETS.to_string(),
            http_timeouts: HttpTimeouts::default(),
            tls: TlsOptions::default(),
        })
    }

    /// Build the HTTP client every session uses
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.http_timeouts.connect)
            .timeout(self.http_timeouts.request)
            .http1_only();

        if self.tls.disable_alpn {
            builder = builder.use_preconfigured_tls(tls_config_without_alpn()?);
        }

        Ok(builder.build()?)
    }
}

fn tls_config_without_alpn() -> Result<rustls::ClientConfig> {
    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let provider = std::sync::Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| crate::errors::GpAuthError::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols.clear();
    Ok(config)
}
