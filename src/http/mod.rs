//! Canonical HTTP model every Fezz action is written against.

mod body;
mod headers;
mod request;
mod response;

pub use body::Body;
pub use headers::Headers;
pub use request::{ActionRequest, Method};
pub use response::{ActionResponse, StatusCode};
