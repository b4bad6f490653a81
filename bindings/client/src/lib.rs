mod client;
mod error;
mod types;

pub mod prelude {
    pub use crate::client::{ShortenExchange, ShortenerClient, DEFAULT_SHORTEN_PATH};
    pub use crate::error::ShortenerClientError;
    pub use crate::types::{ProblemDetails, ProblemProperties, ShortenRequest, ShortenResponse};
}
