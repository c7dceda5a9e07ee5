pub mod constants;
pub mod env;
pub mod node;
pub mod proxy;
pub mod source;
pub mod types;

pub use source::{FetchError, LedgerSource, SourceKind};
pub use types::{FetchRequest, FetchResponse, LedgerInfo, Transaction};
