pub mod client;

pub use client::{HttpCollectorClient, HttpSnapshotFetcher};
