//! Response envelope returned by every store endpoint

use crate::checkin::UploadDeviceConfigResponse;

#[derive(Clone, PartialEq, prost::Message)]
pub struct ResponseWrapper {
    #[prost(message, optional, tag = "1")]
    pub payload: Option<Payload>,
    #[prost(message, optional, tag = "2")]
    pub commands: Option<ServerCommands>,
    #[prost(message, repeated, tag = "3")]
    pub pre_fetch: Vec<PreFetch>,
}

impl ResponseWrapper {
    /// Server-provided error text, if the response carries one
    pub fn display_error(&self) -> Option<&str> {
        self.commands
            .as_ref()
            .and_then(|c| c.display_error_message.as_deref())
            .filter(|m| !m.is_empty())
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ServerCommands {
    #[prost(bool, optional, tag = "1")]
    pub clear_cache: Option<bool>,
    #[prost(string, optional, tag = "2")]
    pub display_error_message: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub log_error_stacktrace: Option<String>,
}

/// A response the server pushed ahead of the request that would fetch it
#[derive(Clone, PartialEq, prost::Message)]
pub struct PreFetch {
    #[prost(string, optional, tag = "1")]
    pub url: Option<String>,
    #[prost(message, optional, boxed, tag = "2")]
    pub response: Option<Box<ResponseWrapper>>,
    #[prost(string, optional, tag = "3")]
    pub etag: Option<String>,
    #[prost(int64, optional, tag = "4")]
    pub ttl: Option<i64>,
    #[prost(int64, optional, tag = "5")]
    pub soft_ttl: Option<i64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Payload {
    #[prost(message, optional, tag = "1")]
    pub list_response: Option<ListResponse>,
    #[prost(message, optional, tag = "2")]
    pub details_response: Option<DetailsResponse>,
    #[prost(message, optional, tag = "5")]
    pub search_response: Option<SearchResponse>,
    #[prost(message, optional, tag = "6")]
    pub toc_response: Option<TocResponse>,
    #[prost(message, optional, tag = "7")]
    pub browse_response: Option<BrowseResponse>,
    #[prost(message, optional, tag = "19")]
    pub bulk_details_response: Option<BulkDetailsResponse>,
    #[prost(message, optional, tag = "22")]
    pub accept_tos_response: Option<AcceptTosResponse>,
    #[prost(message, optional, tag = "28")]
    pub upload_device_config_response: Option<UploadDeviceConfigResponse>,
}

/// Table of contents: session-level metadata
#[derive(Clone, PartialEq, prost::Message)]
pub struct TocResponse {
    #[prost(string, optional, tag = "3")]
    pub tos_content: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub home_url: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub tos_token: Option<String>,
    #[prost(bool, optional, tag = "11")]
    pub requires_upload_device_config: Option<bool>,
    #[prost(string, optional, tag = "22")]
    pub cookie: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AcceptTosResponse {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListResponse {
    #[prost(message, repeated, tag = "2")]
    pub doc: Vec<DocV2>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SearchResponse {
    #[prost(string, optional, tag = "1")]
    pub original_query: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub suggested_query: Option<String>,
    #[prost(message, repeated, tag = "5")]
    pub doc: Vec<DocV2>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DetailsResponse {
    #[prost(string, optional, tag = "2")]
    pub analytics_cookie: Option<String>,
    #[prost(message, optional, tag = "4")]
    pub doc_v2: Option<DocV2>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BulkDetailsRequest {
    #[prost(string, repeated, tag = "1")]
    pub docid: Vec<String>,
    #[prost(bool, optional, tag = "2")]
    pub include_child_docs: Option<bool>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BulkDetailsResponse {
    #[prost(message, repeated, tag = "1")]
    pub entry: Vec<BulkDetailsEntry>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BulkDetailsEntry {
    #[prost(message, optional, tag = "1")]
    pub doc: Option<DocV2>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BrowseResponse {
    #[prost(string, optional, tag = "1")]
    pub contents_url: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub promo_url: Option<String>,
    #[prost(message, repeated, tag = "3")]
    pub category: Vec<BrowseLink>,
    #[prost(message, repeated, tag = "4")]
    pub breadcrumb: Vec<BrowseLink>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BrowseLink {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub data_url: Option<String>,
}

/// A store document (app, category, collection)
#[derive(Clone, PartialEq, prost::Message)]
pub struct DocV2 {
    #[prost(string, optional, tag = "1")]
    pub docid: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub backend_docid: Option<String>,
    #[prost(int32, optional, tag = "3")]
    pub doc_type: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub backend_id: Option<i32>,
    #[prost(string, optional, tag = "5")]
    pub title: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub creator: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub description_html: Option<String>,
    #[prost(message, repeated, tag = "11")]
    pub child: Vec<DocV2>,
    #[prost(message, optional, tag = "12")]
    pub container_metadata: Option<ContainerMetadata>,
    #[prost(string, optional, tag = "16")]
    pub details_url: Option<String>,
    #[prost(string, optional, tag = "17")]
    pub share_url: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerMetadata {
    #[prost(string, optional, tag = "1")]
    pub browse_url: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub next_page_url: Option<String>,
    #[prost(int64, optional, tag = "4")]
    pub estimated_results: Option<i64>,
}
