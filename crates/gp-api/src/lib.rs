//! Store operations over a negotiated session
//!
//! [`PlayClient`] wraps a [`gp_auth::GpAuthClient`] and issues authenticated
//! requests against the store frontend. Responses are returned as the typed
//! wire messages from `gp-proto`.

pub mod client;

pub use client::{CONTENT_TYPE_URLENC, NextPage, PlayClient, RankPage, RequestBody};
