pub mod error;
pub mod mdoc;
pub mod presentation_request;
pub mod projection;
pub mod response;
