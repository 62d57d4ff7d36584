//! YOP platform client library.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller                                                         caller
//!     │ YopRequest                                       YopResponse ▲
//!     ▼                                                              │
//! ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐
//! │ request  │──▶│   auth   │──▶│ transport │──▶│ transport│──▶│ response │
//! │ context  │   │  signer  │   │  builder  │   │ executor │   │  chain   │
//! └──────────┘   └────┬─────┘   └───────────┘   └──────────┘   └────▲─────┘
//!                     │                                             │
//!                     └────────── signature material ───────────────┘
//! ```
//!
//! Every request leaving [`YopClient`] is signed, and every response is run
//! through the [`AnalyzerChain`] before the caller sees it.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod observability;
pub mod request;
pub mod response;
pub mod transport;

pub use auth::{AppCredential, RsaSigner, YopSigner};
pub use client::YopClient;
pub use config::ClientConfig;
pub use error::{YopError, YopResult};
pub use request::{CertType, FileContent, FilePart, TrustAnchor, YopRequest};
pub use response::{AnalyzerChain, ResponseAnalyzer, YopResponse};
