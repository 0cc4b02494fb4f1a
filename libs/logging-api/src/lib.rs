pub mod error;
pub mod record;
pub mod rpc;
pub mod store;

pub use error::{ErrorKind, StoreError};
pub use record::LogRecord;
pub use store::{MapStore, StoreFuture};
