//! Wire serialization and HTTP execution.
//!
//! # Data Flow
//! ```text
//! signed YopRequest
//!     → builder.rs (shape: multipart > json payload > form/query)
//!         → multipart.rs (fields first, then file parts)
//!     → executor.rs (send + body read under one deadline)
//!     → RawResponse
//!
//! streaming upload
//!     → upload.rs (GET source, derive file name)
//!     → producer task → pipe.rs (bounded) → upload body
//! ```
//!
//! # Design Decisions
//! - One deadline per call, shared by download, producer and upload
//! - Bodies are released by drop on every exit path
//! - Caller headers are applied after the content type

pub mod builder;
pub mod executor;
pub mod multipart;
pub mod pipe;
pub mod upload;

pub use builder::{build_call, BodyShape, CallBody, HttpCall};
pub use executor::{execute, Deadline};
pub use multipart::MultipartEncoder;
pub use pipe::{body_pipe, PipeReader, PipeWriter};
pub use upload::{derive_file_name, stream_upload};
