//! Login service (WSAA) adapter: request document, `loginCms` call, ticket decoding.

mod issuer;
mod request;
mod response;

pub use issuer::WsaaTicketIssuer;
pub use request::{login_envelope, LoginTicketRequest, NAMESPACE};
pub use response::parse_login_response;
