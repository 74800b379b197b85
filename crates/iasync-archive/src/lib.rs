//! iasync Internet Archive source
//!
//! This crate implements the iasync item source on top of the Internet
//! Archive HTTP APIs: the scrape API pages through search results and the
//! metadata API resolves each identifier to its file list.

mod client;
mod protocol;

pub use client::{ArchiveClient, ArchiveCursor, ArchiveOptions};
pub use protocol::{FileEntry, MetadataResponse, ScrapeItem, ScrapeResponse};
