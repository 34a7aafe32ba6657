//! Wire schema for the store protocol
//!
//! Messages are declared by hand with `prost` derives and cover only the
//! fields this workspace reads or writes. Unknown fields sent by the server
//! are skipped on decode, so the partial schema stays compatible with the
//! full one.

pub mod checkin;
pub mod response;

pub use checkin::{
    AndroidBuildProto, AndroidCheckinProto, AndroidCheckinRequest, AndroidCheckinResponse,
    DeviceConfigurationProto, UploadDeviceConfigRequest, UploadDeviceConfigResponse,
};
pub use response::{
    AcceptTosResponse, BrowseLink, BrowseResponse, BulkDetailsEntry, BulkDetailsRequest,
    BulkDetailsResponse, ContainerMetadata, DetailsResponse, DocV2, ListResponse, Payload,
    PreFetch, ResponseWrapper, SearchResponse, ServerCommands, TocResponse,
};

/// Content type for protobuf request bodies
pub const CONTENT_TYPE_PROTO: &str = "application/x-protobuf";
