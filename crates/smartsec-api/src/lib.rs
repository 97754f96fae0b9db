// smartsec-api: Async client for the smart security portal's JSON session API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{PortalClient, portal_url};
pub use error::Error;
pub use models::{AlarmStatus, PortalStatus, StateChangeRequest};
pub use transport::{TlsMode, TransportConfig};
