pub mod archive;
pub mod dict;

pub use archive::{ArchiveError, ArchiveResult};
pub use dict::{DictError, DictResult};
