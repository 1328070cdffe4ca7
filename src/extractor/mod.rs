pub mod amount;
pub mod page;
pub mod timestamp;

pub use page::extract_snapshot;
