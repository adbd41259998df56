pub mod config;
pub mod container;
pub mod cookie;
pub mod exception;
pub mod param;
pub mod request;
pub mod response;
pub mod transport;
pub mod util;

pub use config::Config;
pub use container::{ChunkedWriter, File, FileOptions, ResponseContainer, Stream};
pub use cookie::{CookieOptions, CookieSpec};
pub use exception::Exception;
pub use request::Request;
pub use response::{Body, OutputFilter, Response};
pub use transport::{HttpTransport, Transport};
pub use util::HtmlBuilder;
