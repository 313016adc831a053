pub mod endpoint;
pub mod rewrite;
pub mod selector;

pub use endpoint::{BaseUrl, Endpoint, EndpointError, EndpointPool};
pub use rewrite::{CREDENTIAL_HEADER, RelayedResponse};
pub use selector::EndpointSelector;
