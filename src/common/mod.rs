mod fs;
mod http;
mod polygon;

pub(crate) use fs::*;
pub use http::HttpClient;
#[cfg(feature = "download")]
pub use http::ReqwestClient;
pub(crate) use polygon::*;
