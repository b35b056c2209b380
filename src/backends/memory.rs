// In-process document store with the benchmark's observable semantics.
// Stands in for a vendor-backed database so the orchestrator, reports, and
// tests can run end to end; real backends implement DatabaseBackend out of tree.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;

use super::DatabaseBackend;

const UPDATE_FLAG: &str = "benchmark_updated";

pub struct MemoryBackend {
    name: String,
    container: String,
    export_dir: PathBuf,
    collections: HashMap<String, Vec<Value>>,
}

impl MemoryBackend {
    pub fn new(
        name: impl Into<String>,
        container: impl Into<String>,
        export_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            container: container.into(),
            export_dir: export_dir.into(),
            collections: HashMap::new(),
        }
    }

    fn collection(&self, name: &str) -> anyhow::Result<&Vec<Value>> {
        self.collections
            .get(name)
            .with_context(|| format!("unknown collection {name}"))
    }

    fn collection_mut(&mut self, name: &str) -> anyhow::Result<&mut Vec<Value>> {
        self.collections
            .get_mut(name)
            .with_context(|| format!("unknown collection {name}"))
    }
}

impl DatabaseBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn container_name(&self) -> &str {
        &self.container
    }

    async fn connect(&mut self) -> anyhow::Result<()> {
        tracing::info!(database = %self.name, "connected");
        Ok(())
    }

    async fn import(
        &mut self,
        file: &Path,
        collection: &str,
        batch_size: usize,
    ) -> anyhow::Result<u64> {
        let reader = BufReader::new(
            File::open(file).with_context(|| format!("open dataset {}", file.display()))?,
        );
        let mut docs: Vec<Value> = Vec::new();
        let mut batch: Vec<Value> = Vec::with_capacity(batch_size);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            // Undecodable lines are skipped, not fatal.
            match serde_json::from_str::<Value>(&line) {
                Ok(doc) => batch.push(doc),
                Err(_) => continue,
            }
            if batch.len() >= batch_size {
                docs.append(&mut batch);
            }
        }
        docs.append(&mut batch);
        let count = docs.len() as u64;
        self.collections.insert(collection.to_string(), docs);
        tracing::info!(
            database = %self.name,
            collection = %collection,
            documents = count,
            "import complete"
        );
        Ok(count)
    }

    async fn read(&mut self, collection: &str) -> anyhow::Result<()> {
        let docs = self.collection(collection)?;
        let _first = docs.first();
        let matching = docs.iter().filter(|doc| doc.is_object()).count();
        tracing::debug!(collection = %collection, documents = matching, "read scan complete");
        Ok(())
    }

    async fn update(&mut self, collection: &str, limit: u64) -> anyhow::Result<u64> {
        let docs = self.collection_mut(collection)?;
        let mut updated = 0u64;
        for doc in docs.iter_mut().take(limit as usize) {
            if let Value::Object(map) = doc {
                map.insert(UPDATE_FLAG.to_string(), Value::Bool(true));
                updated += 1;
            }
        }
        tracing::debug!(collection = %collection, documents = updated, "update complete");
        Ok(updated)
    }

    async fn delete(&mut self, collection: &str) -> anyhow::Result<u64> {
        let docs = self.collection_mut(collection)?;
        let before = docs.len();
        docs.retain(|doc| {
            !doc.get(UPDATE_FLAG)
                .and_then(Value::as_bool)
                .unwrap_or(false)
        });
        let removed = (before - docs.len()) as u64;
        tracing::debug!(collection = %collection, documents = removed, "delete complete");
        Ok(removed)
    }

    async fn export(&mut self, collection: &str) -> anyhow::Result<PathBuf> {
        let docs = self.collection(collection)?;
        std::fs::create_dir_all(&self.export_dir)
            .with_context(|| format!("create export dir {}", self.export_dir.display()))?;
        let path = self
            .export_dir
            .join(format!("export_{}_{}.json", collection, self.name));
        let mut writer = BufWriter::new(
            File::create(&path).with_context(|| format!("create export {}", path.display()))?,
        );
        for doc in docs {
            serde_json::to_writer(&mut writer, doc)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        tracing::info!(
            collection = %collection,
            documents = docs.len(),
            path = %path.display(),
            "export complete"
        );
        Ok(path)
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.collections.clear();
        tracing::info!(database = %self.name, "connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(dir: &Path) -> MemoryBackend {
        MemoryBackend::new("memdb", "memdb-container", dir)
    }

    fn write_dataset(dir: &Path, lines: &[&str]) -> PathBuf {
        let path = dir.join("fixture.json");
        let mut f = File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        path
    }

    #[tokio::test]
    async fn import_counts_documents_and_skips_bad_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = write_dataset(
            dir.path(),
            &[
                r#"{"rating": 5, "review_text": "great"}"#,
                "not json at all",
                r#"{"rating": 2}"#,
                "",
                r#"{"rating": 4}"#,
            ],
        );
        let mut db = backend(dir.path());
        let count = db.import(&file, "reviews", 2).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn update_flags_then_delete_removes_exactly_those() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = write_dataset(
            dir.path(),
            &[r#"{"a": 1}"#, r#"{"a": 2}"#, r#"{"a": 3}"#, r#"{"a": 4}"#],
        );
        let mut db = backend(dir.path());
        db.import(&file, "docs", 100).await.unwrap();

        let updated = db.update("docs", 2).await.unwrap();
        assert_eq!(updated, 2);
        let deleted = db.delete("docs").await.unwrap();
        assert_eq!(deleted, 2);
        // A second delete has nothing flagged left.
        assert_eq!(db.delete("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn export_writes_surviving_documents_as_json_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = write_dataset(dir.path(), &[r#"{"a": 1}"#, r#"{"a": 2}"#, r#"{"a": 3}"#]);
        let mut db = backend(dir.path());
        db.import(&file, "docs", 100).await.unwrap();
        db.update("docs", 1).await.unwrap();
        db.delete("docs").await.unwrap();

        let path = db.export("docs").await.unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let doc: Value = serde_json::from_str(line).unwrap();
            assert!(doc.get("a").is_some());
        }
    }

    #[tokio::test]
    async fn operations_on_unknown_collection_fail() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut db = backend(dir.path());
        assert!(db.read("missing").await.is_err());
        assert!(db.update("missing", 1).await.is_err());
        assert!(db.delete("missing").await.is_err());
        assert!(db.export("missing").await.is_err());
    }
}
