//! HTTP plumbing for the sandbox: routing, typed request params, response
//! DTOs and error mapping. All stream mechanics live in the `engine` crate;
//! handlers here only resolve a stream, make sure its producer is running,
//! and hand the connection to a tail.

mod controller;
mod extractors;
mod params;
mod response;

pub mod error;
pub mod router;

pub use error::Error;
pub use router::define_routes;
