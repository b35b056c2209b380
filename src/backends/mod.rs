// Database lifecycle backends

mod memory;

pub use memory::MemoryBackend;

use std::future::Future;
use std::path::{Path, PathBuf};

/// One document database under benchmark: the five lifecycle operations plus
/// connection management. Errors are opaque to the measurement core; each
/// backend reports whatever its driver surfaces.
pub trait DatabaseBackend {
    /// Human-readable database name (e.g. "mongodb").
    fn name(&self) -> &str;
    /// Docker container to sample while operations run.
    fn container_name(&self) -> &str;

    fn connect(&mut self) -> impl Future<Output = anyhow::Result<()>>;

    /// Bulk-load documents from `file` into `collection` in `batch_size`
    /// chunks, replacing any existing collection; returns the document count.
    fn import(
        &mut self,
        file: &Path,
        collection: &str,
        batch_size: usize,
    ) -> impl Future<Output = anyhow::Result<u64>>;

    fn read(&mut self, collection: &str) -> impl Future<Output = anyhow::Result<()>>;

    /// Flag up to `limit` documents as updated; returns the number updated.
    fn update(&mut self, collection: &str, limit: u64)
    -> impl Future<Output = anyhow::Result<u64>>;

    /// Remove previously flagged documents; returns the number removed.
    fn delete(&mut self, collection: &str) -> impl Future<Output = anyhow::Result<u64>>;

    /// Write the surviving documents to a file; returns its path.
    fn export(&mut self, collection: &str) -> impl Future<Output = anyhow::Result<PathBuf>>;

    fn close(&mut self) -> impl Future<Output = anyhow::Result<()>>;
}
