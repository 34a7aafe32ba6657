use chrono::{DateTime, Utc};
use gp_proto::{
    AndroidBuildProto, AndroidCheckinProto, AndroidCheckinRequest, DeviceConfigurationProto,
};

use crate::device::{DeviceContext, DeviceProfile};

/// Checkin protocol version sent by the store client
const CHECKIN_VERSION: i32 = 3;

/// Initial checkin record for a device that has no server-assigned id yet
pub fn build_checkin_request(ctx: &DeviceContext) -> AndroidCheckinRequest {
    build_checkin_request_at(ctx, Utc::now())
}

pub(crate) fn build_checkin_request_at(
    ctx: &DeviceContext,
    now: DateTime<Utc>,
) -> AndroidCheckinRequest {
    let profile = ctx.profile();
    AndroidCheckinRequest {
        id: Some(0),
        checkin: Some(android_checkin(profile, now)),
        locale: Some(ctx.locale().to_string()),
        time_zone: Some(ctx.timezone().to_string()),
        version: Some(CHECKIN_VERSION),
        device_configuration: Some(device_configuration(profile)),
        fragment: Some(0),
        ..Default::default()
    }
}

/// Second checkin record binding the server-assigned identity to an account
pub fn build_checkin_update(
    previous: &AndroidCheckinRequest,
    account_email: &str,
    ac2dm_token: &str,
    device_id: u64,
    security_token: u64,
) -> AndroidCheckinRequest {
    let mut request = previous.clone();
    // Same 64 bits; the request field is signed
    request.id = Some(device_id as i64);
    request.security_token = Some(security_token);
    request.account_cookie.push(format!("[{}]", account_email));
    request.account_cookie.push(ac2dm_token.to_string());
    request
}

/// Capabilities block shared by checkin and device-config upload
pub fn device_configuration(profile: &DeviceProfile) -> DeviceConfigurationProto {
    DeviceConfigurationProto {
        touch_screen: Some(profile.touch_screen),
        keyboard: Some(profile.keyboard),
        navigation: Some(profile.navigation),
        screen_layout: Some(profile.screen.layout),
        has_hard_keyboard: Some(profile.has_hard_keyboard),
        has_five_way_navigation: Some(profile.has_five_way_navigation),
        screen_density: Some(profile.screen.density),
        gl_es_version: Some(profile.gl_version),
        system_shared_library: profile.shared_libraries.clone(),
        system_available_feature: profile.features.clone(),
        native_platform: profile.platforms.clone(),
        screen_width: Some(profile.screen.width),
        screen_height: Some(profile.screen.height),
        system_supported_locale: profile.locales.clone(),
        gl_extension: profile.gl_extensions.clone(),
    }
}

fn android_build(profile: &DeviceProfile, now: DateTime<Utc>) -> AndroidBuildProto {
    let build = &profile.build;
    AndroidBuildProto {
        id: Some(build.fingerprint.clone()),
        product: Some(build.hardware.clone()),
        carrier: Some(build.brand.clone()),
        radio: Some(build.radio.clone()),
        bootloader: Some(build.bootloader.clone()),
        client: Some(profile.client.clone()),
        // The store client reports seconds divided by a thousand here
        timestamp: Some(now.timestamp() / 1000),
        google_services: Some(profile.gsf_version),
        device: Some(build.device.clone()),
        sdk_version: Some(build.sdk_int),
        model: Some(build.model.clone()),
        manufacturer: Some(build.manufacturer.clone()),
        build_product: Some(build.product.clone()),
        ota_installed: Some(false),
    }
}

fn android_checkin(profile: &DeviceProfile, now: DateTime<Utc>) -> AndroidCheckinProto {
    AndroidCheckinProto {
        build: Some(android_build(profile, now)),
        last_checkin_msec: Some(0),
        cell_operator: Some(profile.cell_operator.clone()),
        sim_operator: Some(profile.sim_operator.clone()),
        roaming: Some(profile.roaming.clone()),
        user_number: Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests::sample_profile;
    use prost::Message;

    fn context() -> DeviceContext {
        DeviceContext::new(sample_profile(), "fr_FR", Some("Europe/Paris")).unwrap()
    }

    #[test]
    fn test_checkin_request_maps_profile() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let request = build_checkin_request_at(&context(), now);

        assert_eq!(request.id, Some(0));
        assert_eq!(request.locale.as_deref(), Some("fr_FR"));
        assert_eq!(request.time_zone.as_deref(), Some("Europe/Paris"));
        assert_eq!(request.version, Some(3));
        assert!(request.security_token.is_none());
        assert!(request.account_cookie.is_empty());

        let checkin = request.checkin.as_ref().unwrap();
        assert_eq!(checkin.cell_operator.as_deref(), Some("310260"));
        let build = checkin.build.as_ref().unwrap();
        assert_eq!(
            build.id.as_deref(),
            Some("google/walleye/walleye:8.1.0/OPM1.171019.011/4448085:user/release-keys")
        );
        assert_eq!(build.product.as_deref(), Some("walleye"));
        assert_eq!(build.carrier.as_deref(), Some("google"));
        assert_eq!(build.sdk_version, Some(27));
        assert_eq!(build.timestamp, Some(1_700_000));
        assert_eq!(build.ota_installed, Some(false));

        let config = request.device_configuration.as_ref().unwrap();
        assert_eq!(config.native_platform, vec!["arm64-v8a", "armeabi-v7a", "armeabi"]);
        assert_eq!(config.system_supported_locale, vec!["en", "en_US", "fr_FR"]);
        assert_eq!(config.gl_es_version, Some(196610));
        assert_eq!(config.has_hard_keyboard, Some(false));
    }

    #[test]
    fn test_checkin_request_is_deterministic() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let a = build_checkin_request_at(&context(), now).encode_to_vec();
        let b = build_checkin_request_at(&context(), now).encode_to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn test_checkin_update_adds_identity_and_cookies() {
        let initial = build_checkin_request(&context());
        let update = build_checkin_update(
            &initial,
            "user@example.com",
            "ac2dm-token",
            0x3a5f_0000_1234_abcd,
            42,
        );

        assert_eq!(update.id, Some(0x3a5f_0000_1234_abcd));
        assert_eq!(update.security_token, Some(42));
        assert_eq!(update.account_cookie, vec!["[user@example.com]", "ac2dm-token"]);
        assert_eq!(update.checkin, initial.checkin);
        assert_eq!(update.device_configuration, initial.device_configuration);
        assert!(initial.account_cookie.is_empty());
    }

    #[test]
    fn test_checkin_update_encodes_device_id_as_varint() {
        let initial = AndroidCheckinRequest::default();
        let update = build_checkin_update(
            &initial,
            "user@example.com",
            "token",
            0x3a5f_0000_1234_abcd,
            7,
        );
        let bytes = update.encode_to_vec();

        // field 2, wire type 0
        assert_eq!(bytes[0], 0x10);

        let high_bit =
            build_checkin_update(&initial, "user@example.com", "token", u64::MAX, 7);
        assert_eq!(high_bit.id, Some(-1));
        assert_eq!(high_bit.encode_to_vec()[0], 0x10);
    }
}
