use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::protocol;
use crate::errors::{GpAuthError, Result};

/// Build descriptors of the impersonated device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildInfo {
    pub fingerprint: String,
    pub hardware: String,
    pub brand: String,
    pub radio: String,
    pub bootloader: String,
    pub device: String,
    pub model: String,
    pub manufacturer: String,
    pub product: String,
    pub id: String,
    pub version_release: String,
    pub sdk_int: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScreenInfo {
    pub density: i32,
    pub width: i32,
    pub height: i32,
    pub layout: i32,
}

/// Fixed identity attributes of a named virtual device
///
/// Built from a flat key/value section of a profile store. Every attribute the
/// checkin and header code needs is checked when the profile is loaded, so a
/// `DeviceProfile` value is always complete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceProfile {
    pub name: String,
    pub build: BuildInfo,
    pub screen: ScreenInfo,
    pub client: String,
    pub gsf_version: i32,
    pub vending_version: i32,
    pub vending_version_string: Option<String>,
    pub cell_operator: String,
    pub sim_operator: String,
    pub roaming: String,
    pub timezone: Option<String>,
    pub touch_screen: i32,
    pub keyboard: i32,
    pub navigation: i32,
    pub has_hard_keyboard: bool,
    pub has_five_way_navigation: bool,
    pub gl_version: i32,
    pub gl_extensions: Vec<String>,
    pub platforms: Vec<String>,
    pub shared_libraries: Vec<String>,
    pub features: Vec<String>,
    pub locales: Vec<String>,
}

impl DeviceProfile {
    /// Validate a raw attribute section and build the typed profile
    pub fn from_attributes(name: &str, attributes: &HashMap<String, String>) -> Result<Self> {
        let attrs = Attributes { profile: name, map: attributes };

        Ok(Self {
            name: name.to_string(),
            build: BuildInfo {
                fingerprint: attrs.required("build.fingerprint")?,
                hardware: attrs.required("build.hardware")?,
                brand: attrs.required("build.brand")?,
                radio: attrs.required("build.radio")?,
                bootloader: attrs.required("build.bootloader")?,
                device: attrs.required("build.device")?,
                model: attrs.required("build.model")?,
                manufacturer: attrs.required("build.manufacturer")?,
                product: attrs.required("build.product")?,
                id: attrs.required("build.id")?,
                version_release: attrs.required("build.version.release")?,
                sdk_int: attrs.int("build.version.sdk_int")?,
            },
            screen: ScreenInfo {
                density: attrs.int("screen.density")?,
                width: attrs.int("screen.width")?,
                height: attrs.int("screen.height")?,
                layout: attrs.int("screenlayout")?,
            },
            client: attrs.required("client")?,
            gsf_version: attrs.int("gsf.version")?,
            vending_version: attrs.int("vending.version")?,
            vending_version_string: attrs.optional("vending.versionstring"),
            cell_operator: attrs.required("celloperator")?,
            sim_operator: attrs.required("simoperator")?,
            roaming: attrs.required("roaming")?,
            timezone: attrs.optional("timezone"),
            touch_screen: attrs.int("touchscreen")?,
            keyboard: attrs.int("keyboard")?,
            navigation: attrs.int("navigation")?,
            has_hard_keyboard: attrs.flag("hashardkeyboard")?,
            has_five_way_navigation: attrs.flag("hasfivewaynavigation")?,
            gl_version: attrs.int("gl.version")?,
            gl_extensions: attrs.list("gl.extensions")?,
            platforms: attrs.list("platforms")?,
            shared_libraries: attrs.list("sharedlibraries")?,
            features: attrs.list("features")?,
            locales: attrs.list("locales")?,
        })
    }
}

/// Attribute lookups that report which profile and key failed
struct Attributes<'a> {
    profile: &'a str,
    map: &'a HashMap<String, String>,
}

impl Attributes<'_> {
    fn required(&self, key: &str) -> Result<String> {
        self.map
            .get(key)
            .cloned()
            .ok_or_else(|| GpAuthError::MissingProfileAttribute {
                profile: self.profile.to_string(),
                key: key.to_string(),
            })
    }

    fn optional(&self, key: &str) -> Option<String> {
        self.map
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn int(&self, key: &str) -> Result<i32> {
        let value = self.required(key)?;
        value
            .trim()
            .parse()
            .map_err(|_| GpAuthError::InvalidProfileAttribute {
                key: key.to_string(),
                value,
            })
    }

    fn flag(&self, key: &str) -> Result<bool> {
        Ok(self.required(key)? == "true")
    }

    /// Comma-separated list; items are trimmed and empty items dropped
    fn list(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .required(key)?
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Check that a locale looks like `en_US`
pub fn validate_locale(locale: &str) -> Result<()> {
    let bytes = locale.as_bytes();
    let valid = bytes.len() == 5
        && bytes[..2].iter().all(u8::is_ascii_lowercase)
        && bytes[2] == b'_'
        && bytes[3..].iter().all(u8::is_ascii_uppercase);

    if valid {
        Ok(())
    } else {
        Err(GpAuthError::InvalidLocale(locale.to_string()))
    }
}

/// Pick the explicit timezone, falling back to the one the profile declares
pub fn resolve_timezone(explicit: Option<&str>, profile: &DeviceProfile) -> Result<String> {
    match explicit.map(str::trim).filter(|tz| !tz.is_empty()) {
        Some(tz) => Ok(tz.to_string()),
        None => profile.timezone.clone().ok_or(GpAuthError::InvalidTimezone),
    }
}

/// Per-session device identity: profile plus validated locale and timezone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceContext {
    profile: DeviceProfile,
    locale: String,
    timezone: String,
}

impl DeviceContext {
    pub fn new(profile: DeviceProfile, locale: &str, timezone: Option<&str>) -> Result<Self> {
        validate_locale(locale)?;
        let timezone = resolve_timezone(timezone, &profile)?;
        Ok(Self {
            profile,
            locale: locale.to_string(),
            timezone,
        })
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Two-letter country prefix of the locale
    pub fn country(&self) -> &str {
        &self.locale[..2]
    }

    /// User agent of the store client on this device
    pub fn user_agent(&self) -> String {
        let p = &self.profile;
        let version_string = p
            .vending_version_string
            .as_deref()
            .unwrap_or(protocol::DEFAULT_VENDING_VERSION_STRING);

        format!(
            "Android-Finsky/{version_string} (api=3,versionCode={},sdk={},device={},hardware={},\
             product={},platformVersionRelease={},model={},buildId={},isWideScreen=0,\
             supportedAbis={})",
            p.vending_version,
            p.build.sdk_int,
            p.build.device,
            p.build.hardware,
            p.build.product,
            p.build.version_release,
            p.build.model,
            p.build.id,
            p.platforms.join(";"),
        )
    }

    /// User agent of the account manager on this device
    pub fn auth_user_agent(&self) -> String {
        format!(
            "{} ({} {})",
            protocol::AUTH_USER_AGENT,
            self.profile.build.device,
            self.profile.build.id
        )
    }
}
