//! View controllers over the hooks layer

pub mod findings;

pub use findings::FindingsList;
