//! Device registration messages

/// Build descriptors of the impersonated device
#[derive(Clone, PartialEq, prost::Message)]
pub struct AndroidBuildProto {
    /// Build fingerprint
    #[prost(string, optional, tag = "1")]
    pub id: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub product: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub carrier: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub radio: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub bootloader: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub client: Option<String>,
    #[prost(int64, optional, tag = "7")]
    pub timestamp: Option<i64>,
    #[prost(int32, optional, tag = "8")]
    pub google_services: Option<i32>,
    #[prost(string, optional, tag = "9")]
    pub device: Option<String>,
    #[prost(int32, optional, tag = "10")]
    pub sdk_version: Option<i32>,
    #[prost(string, optional, tag = "11")]
    pub model: Option<String>,
    #[prost(string, optional, tag = "12")]
    pub manufacturer: Option<String>,
    #[prost(string, optional, tag = "13")]
    pub build_product: Option<String>,
    #[prost(bool, optional, tag = "14")]
    pub ota_installed: Option<bool>,
}

/// Build and carrier descriptors submitted on checkin
#[derive(Clone, PartialEq, prost::Message)]
pub struct AndroidCheckinProto {
    #[prost(message, optional, tag = "1")]
    pub build: Option<AndroidBuildProto>,
    #[prost(int64, optional, tag = "2")]
    pub last_checkin_msec: Option<i64>,
    #[prost(string, optional, tag = "6")]
    pub cell_operator: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub sim_operator: Option<String>,
    #[prost(string, optional, tag = "8")]
    pub roaming: Option<String>,
    #[prost(int32, optional, tag = "9")]
    pub user_number: Option<i32>,
}

/// Hardware and software capabilities of the device
#[derive(Clone, PartialEq, prost::Message)]
pub struct DeviceConfigurationProto {
    #[prost(int32, optional, tag = "1")]
    pub touch_screen: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub keyboard: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub navigation: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub screen_layout: Option<i32>,
    #[prost(bool, optional, tag = "5")]
    pub has_hard_keyboard: Option<bool>,
    #[prost(bool, optional, tag = "6")]
    pub has_five_way_navigation: Option<bool>,
    #[prost(int32, optional, tag = "7")]
    pub screen_density: Option<i32>,
    #[prost(int32, optional, tag = "8")]
    pub gl_es_version: Option<i32>,
    #[prost(string, repeated, tag = "9")]
    pub system_shared_library: Vec<String>,
    #[prost(string, repeated, tag = "10")]
    pub system_available_feature: Vec<String>,
    #[prost(string, repeated, tag = "11")]
    pub native_platform: Vec<String>,
    #[prost(int32, optional, tag = "12")]
    pub screen_width: Option<i32>,
    #[prost(int32, optional, tag = "13")]
    pub screen_height: Option<i32>,
    #[prost(string, repeated, tag = "14")]
    pub system_supported_locale: Vec<String>,
    #[prost(string, repeated, tag = "15")]
    pub gl_extension: Vec<String>,
}

/// Body of a checkin call
///
/// The first submission carries `id = 0` and no security token; the update
/// carries the server-assigned values plus account cookies.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AndroidCheckinRequest {
    /// Server-assigned device id; a varint here, unlike the response's fixed64
    #[prost(int64, optional, tag = "2")]
    pub id: Option<i64>,
    #[prost(message, optional, tag = "4")]
    pub checkin: Option<AndroidCheckinProto>,
    #[prost(string, optional, tag = "6")]
    pub locale: Option<String>,
    #[prost(string, repeated, tag = "11")]
    pub account_cookie: Vec<String>,
    #[prost(string, optional, tag = "12")]
    pub time_zone: Option<String>,
    #[prost(fixed64, optional, tag = "13")]
    pub security_token: Option<u64>,
    #[prost(int32, optional, tag = "14")]
    pub version: Option<i32>,
    #[prost(message, optional, tag = "18")]
    pub device_configuration: Option<DeviceConfigurationProto>,
    #[prost(int32, optional, tag = "20")]
    pub fragment: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AndroidCheckinResponse {
    #[prost(bool, optional, tag = "1")]
    pub stats_ok: Option<bool>,
    #[prost(int64, optional, tag = "3")]
    pub time_msec: Option<i64>,
    #[prost(string, optional, tag = "4")]
    pub digest: Option<String>,
    #[prost(bool, optional, tag = "6")]
    pub market_ok: Option<bool>,
    #[prost(fixed64, optional, tag = "7")]
    pub android_id: Option<u64>,
    #[prost(fixed64, optional, tag = "8")]
    pub security_token: Option<u64>,
    #[prost(string, optional, tag = "12")]
    pub device_checkin_consistency_token: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UploadDeviceConfigRequest {
    #[prost(message, optional, tag = "1")]
    pub device_configuration: Option<DeviceConfigurationProto>,
    #[prost(string, optional, tag = "2")]
    pub manufacturer: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub gcm_registration_id: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UploadDeviceConfigResponse {
    #[prost(string, optional, tag = "1")]
    pub upload_device_config_token: Option<String>,
}
