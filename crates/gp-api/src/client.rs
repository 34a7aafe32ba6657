use gp_auth::{GpAuthClient, GpAuthError, Result, ensure_success};
use gp_proto::{
    BrowseResponse, BulkDetailsRequest, CONTENT_TYPE_PROTO, DocV2, ResponseWrapper,
};
use prost::Message;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::{debug, instrument};
use url::Url;

/// Content type the store client declares on requests without a protobuf body
pub const CONTENT_TYPE_URLENC: &str = "application/x-www-form-urlencoded; charset=UTF-8";

mod paths {
    pub const TOC: &str = "toc";
    pub const ACCEPT_TOS: &str = "acceptTos";
    pub const SEARCH: &str = "search";
    pub const DETAILS: &str = "details";
    pub const BULK_DETAILS: &str = "bulkDetails";
    pub const BROWSE: &str = "browse";
    pub const HOME: &str = "homeV2";
    pub const TOP_CHARTS: &str = "listTopChartItems";
}

/// Encoded request body and its content type
#[derive(Debug, Clone)]
pub struct RequestBody {
    pub content: Vec<u8>,
    pub content_type: &'static str,
}

impl RequestBody {
    pub fn proto(message: &impl Message) -> Self {
        Self {
            content: message.encode_to_vec(),
            content_type: CONTENT_TYPE_PROTO,
        }
    }
}

/// Where the next page of a top chart is, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Relative URL to pass back to [`PlayClient::list_ranks`]
    Url(String),
    Exhausted,
}

/// One page of a top chart
#[derive(Debug, Clone, PartialEq)]
pub struct RankPage {
    pub apps: Vec<DocV2>,
    pub next: NextPage,
}

/// Store operations on top of a negotiated session
#[derive(Debug, Clone)]
pub struct PlayClient {
    auth: GpAuthClient,
}

impl PlayClient {
    pub fn new(auth: GpAuthClient) -> Self {
        Self { auth }
    }

    pub fn auth(&self) -> &GpAuthClient {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut GpAuthClient {
        &mut self.auth
    }

    pub fn into_auth(self) -> GpAuthClient {
        self.auth
    }

    fn fdfe_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        Ok(with_query(self.auth.config().endpoints.fdfe.join(path)?, query))
    }

    fn play_fdfe_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        Ok(with_query(self.auth.config().endpoints.play_fdfe.join(path)?, query))
    }

    /// Issue an authenticated store request and decode the response envelope
    ///
    /// Fails before any I/O when the session has no sub-token.
    #[instrument(skip(self, body), fields(path = %url.path()))]
    pub async fn execute(&self, url: Url, body: Option<RequestBody>) -> Result<ResponseWrapper> {
        let mut headers = self.auth.authorized_headers()?;
        let content_type = body
            .as_ref()
            .map_or(CONTENT_TYPE_URLENC, |b| b.content_type);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

        let request = match body {
            Some(body) => self.auth.http().post(url).body(body.content),
            None => self.auth.http().get(url),
        };
        let response = request.headers(headers).send().await?;
        let response = ensure_success(response).await?;

        let wrapper = ResponseWrapper::decode(response.bytes().await?)?;
        if let Some(message) = wrapper.display_error() {
            return Err(GpAuthError::Request(message.to_string()));
        }

        Ok(wrapper)
    }

    /// Fetch the table of contents, accepting the terms of service if offered
    ///
    /// The session cookie it hands out is attached to every later request.
    pub async fn toc(&mut self) -> Result<gp_proto::TocResponse> {
        let wrapper = self.execute(self.fdfe_url(paths::TOC, &[])?, None).await?;
        let toc = wrapper
            .payload
            .and_then(|p| p.toc_response)
            .unwrap_or_default();

        if let (Some(_), Some(token)) = (&toc.tos_content, &toc.tos_token) {
            debug!("Accepting terms of service");
            self.accept_tos(token).await?;
        }
        if let Some(cookie) = &toc.cookie {
            self.auth.set_dfe_cookie(cookie.clone());
        }

        Ok(toc)
    }

    pub async fn accept_tos(&self, tos_token: &str) -> Result<()> {
        let url = self.fdfe_url(paths::ACCEPT_TOS, &[("tost", tos_token), ("toscme", "false")])?;
        self.execute(url, None).await?;
        Ok(())
    }

    /// Search apps by free text
    #[instrument(skip(self))]
    pub async fn search(&mut self, query: &str) -> Result<Vec<DocV2>> {
        self.toc().await?;

        let url = self.fdfe_url(paths::SEARCH, &[("c", "3"), ("q", query)])?;
        let wrapper = self.execute(url, None).await?;
        Ok(list_docs(prefetched_or(wrapper)))
    }

    /// Details of one app, optionally at a specific version
    #[instrument(skip(self))]
    pub async fn details(&self, package: &str, version_code: Option<u64>) -> Result<Option<DocV2>> {
        let version = version_code.map(|vc| vc.to_string());
        let mut query = vec![("doc", package)];
        if let Some(vc) = &version {
            query.push(("vc", vc.as_str()));
        }

        let wrapper = self.execute(self.fdfe_url(paths::DETAILS, &query)?, None).await?;
        Ok(wrapper
            .payload
            .and_then(|p| p.details_response)
            .and_then(|d| d.doc_v2))
    }

    /// Details of several apps in one request
    ///
    /// Entries line up with `packages`; unknown packages are `None`.
    #[instrument(skip(self))]
    pub async fn bulk_details(&self, packages: &[&str]) -> Result<Vec<Option<DocV2>>> {
        let request = BulkDetailsRequest {
            docid: packages.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        };
        let url = self.fdfe_url(paths::BULK_DETAILS, &[("au", "1")])?;

        let wrapper = self.execute(url, Some(RequestBody::proto(&request))).await?;
        Ok(wrapper
            .payload
            .and_then(|p| p.bulk_details_response)
            .map(|r| r.entry.into_iter().map(|e| e.doc).collect())
            .unwrap_or_default())
    }

    /// One page of a top chart
    ///
    /// Pass the previous page's [`NextPage::Url`] to continue; a page without
    /// continuation metadata ends the listing.
    #[instrument(skip(self))]
    pub async fn list_ranks(
        &self,
        chart: &str,
        category: Option<&str>,
        next_page: Option<&str>,
    ) -> Result<RankPage> {
        let url = match next_page {
            Some(next) => self.fdfe_url(next, &[("stcid", chart)])?,
            None => {
                let mut query = vec![("c", "3"), ("stcid", chart)];
                if let Some(category) = category {
                    query.push(("scat", category));
                }
                self.play_fdfe_url(paths::TOP_CHARTS, &query)?
            }
        };

        let wrapper = self.execute(url, None).await?;
        let docs = list_docs(wrapper);

        let next = docs
            .first()
            .and_then(|d| d.child.first())
            .and_then(|c| c.container_metadata.as_ref())
            .and_then(|m| m.next_page_url.clone())
            .filter(|u| !u.is_empty())
            .map_or(NextPage::Exhausted, NextPage::Url);

        // categories -> sub-categories -> apps
        let apps = docs
            .into_iter()
            .flat_map(|d| d.child)
            .flat_map(|c| c.child)
            .collect();

        Ok(RankPage { apps, next })
    }

    /// Categories, or apps filtered by category and sub-category
    #[instrument(skip(self))]
    pub async fn browse(
        &self,
        category: Option<&str>,
        sub_category: Option<&str>,
    ) -> Result<BrowseResponse> {
        let mut query = vec![("c", "3")];
        if let Some(category) = category {
            query.push(("cat", category));
        }
        if let Some(sub_category) = sub_category {
            query.push(("ctr", sub_category));
        }

        let wrapper = self.execute(self.fdfe_url(paths::BROWSE, &query)?, None).await?;
        Ok(wrapper
            .payload
            .and_then(|p| p.browse_response)
            .unwrap_or_default())
    }

    /// Home page clusters, optionally for one category
    #[instrument(skip(self))]
    pub async fn home(&self, category: Option<&str>) -> Result<Vec<DocV2>> {
        let mut query = vec![("c", "3"), ("nocache_isui", "true")];
        if let Some(category) = category {
            query.push(("cat", category));
        }

        let wrapper = self.execute(self.fdfe_url(paths::HOME, &query)?, None).await?;
        Ok(list_docs(prefetched_or(wrapper)))
    }
}

fn with_query(mut url: Url, query: &[(&str, &str)]) -> Url {
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    url
}

/// The first prefetched response if the server pushed one, else the envelope itself
fn prefetched_or(wrapper: ResponseWrapper) -> ResponseWrapper {
    match wrapper.pre_fetch.into_iter().next().and_then(|p| p.response) {
        Some(response) => *response,
        None => ResponseWrapper {
            pre_fetch: Vec::new(),
            ..wrapper
        },
    }
}

fn list_docs(wrapper: ResponseWrapper) -> Vec<DocV2> {
    wrapper
        .payload
        .and_then(|p| p.list_response)
        .map(|l| l.doc)
        .unwrap_or_default()
}
