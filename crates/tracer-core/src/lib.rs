//! Core types and trait definitions for the tracer alumni registry.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::RecordStore`]; the HTTP layer drives
//! everything through [`lifecycle::Registry`], which owns the authorization
//! checks and multi-step transitions.

// `RecordStore` spells out `Send` on its returned futures; the advisory lint
// about `async fn` in public traits does not apply.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod actor;
pub mod engagement;
pub mod error;
pub mod lifecycle;
pub mod person;
pub mod policy;
pub mod query;
pub mod store;
pub mod upload;

pub use error::{Error, Result};
