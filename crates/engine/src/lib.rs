pub mod cache;
pub mod error;
pub mod filter;
pub mod index;
pub mod library;
pub mod mapper;
pub mod normalize;
pub mod preview;
pub mod view;

#[cfg(test)]
pub mod harness;

pub use cache::{CacheKey, Clock, SystemClock, TimeBoxedCache};
pub use error::LibraryError;
pub use library::{Library, LibraryOptions, LoadedTab, TabPanel};
pub use mapper::{FunctionRecord, HeaderMatch, MappedTable};
pub use view::{DisplayMode, RecordId, ViewState};
