pub mod error;
pub mod handler;
pub mod odata;

pub use error::FetchError;
pub use handler::{PageRequest, PageSource};
pub use odata::{DEFAULT_SERVICE_PATH, ODataSettings, ODataSource, decode_envelope};
