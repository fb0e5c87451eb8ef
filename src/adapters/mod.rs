// Adapters layer: concrete implementations of the domain ports.

pub mod http;
pub mod source;

pub use http::HttpOrderService;
pub use source::FileSource;
