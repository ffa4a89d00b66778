//! Core infrastructure for the ledgerly inference gateway.
//!
//! This crate holds the pieces shared between the gateway and anything
//! that plugs into it: the request/response model at the backend seam,
//! the backend failure taxonomy, and the event listener system used for
//! observability hooks.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod events;
pub mod request;

pub use error::BackendError;
pub use request::{AttemptRequest, InferenceResponse, OperationKind, ResponseSource};
