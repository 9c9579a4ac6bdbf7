//! # restkit
//!
//! Blocking JSON client for the Certfix management API.
//!
//! This crate provides:
//! - A [`Transport`] trait with an HTTP implementation and an in-memory mock
//! - Retry with exponential backoff for idempotent calls
//! - A [`Gateway`] exposing one method per remote resource operation
//!
//! ## Example
//!
//! ```no_run
//! use restkit::{Gateway, HttpTransport, extract_id};
//! use restkit::types::EventPayload;
//!
//! let transport = HttpTransport::new("https://api.example.com");
//! let gateway = Gateway::new(&transport, "bearer-token");
//!
//! let body = gateway
//!     .create_event(&EventPayload {
//!         name: "deploy".to_string(),
//!         severity: "high".to_string(),
//!         enabled: true,
//!         reset_time_unit: None,
//!         reset_time_value: None,
//!     })
//!     .expect("create failed");
//!
//! println!("created {:?}", extract_id(&body, "event_id"));
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod gateway;
pub mod retry;
pub mod transport;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use gateway::{Gateway, extract_id, list_items};
pub use retry::RetryConfig;
pub use transport::http::HttpTransport;
pub use transport::{Method, MockResponse, MockTransport, RecordedCall, Request, Transport};
