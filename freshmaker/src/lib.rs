//! Clients for the Errata Tool and LightBlue REST APIs.
//!
//! Both clients talk HTTP through the [`Transport`] trait so callers (and
//! tests) can swap the network out.

pub mod config;
pub mod document;
pub mod errata;
pub mod error;
pub mod events;
pub mod lightblue;
pub mod transport;

pub use config::LightBlueConfig;
pub use document::{ContainerImage, ContainerRepository, Document};
pub use errata::{deduplicate_advisories, Advisory, Errata};
pub use error::{Error, Result};
pub use events::Event;
pub use lightblue::{FindRequest, LightBlue, ObjectType, RequestFailure};
pub use transport::{HttpResponse, HttpTransport, Transport};
