//! Network side of a walk.
//!
//! - `transport`: the `Transport` trait and its reqwest-backed `HttpTransport`
//! - `connectivity`: the pre-flight reachability gate
//! - `mock`: canned-response transport for tests

pub mod connectivity;
#[cfg(test)]
pub mod mock;
pub mod transport;

pub use connectivity::{ensure_reachable, ensure_reachable_with};
pub use transport::{HttpTransport, Page, Transport, TransportSettings};
