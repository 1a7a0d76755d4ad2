use crate::errors::{ExportError, ExportResult};
use log::debug;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// File-delivery collaborator. Receives a complete payload or nothing.
pub trait ExportSink: Send + Sync {
    /// Delivers `bytes` under `filename`; returns where it landed, if anywhere
    /// addressable.
    fn save(&self, bytes: &[u8], filename: &str) -> ExportResult<Option<PathBuf>>;
}

/// Writes exports into a directory. Files appear atomically: the payload goes
/// to a temp file in the same directory which is then renamed into place.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for DirectorySink {
    fn save(&self, bytes: &[u8], filename: &str) -> ExportResult<Option<PathBuf>> {
        if filename.contains(['/', '\\']) || filename.is_empty() {
            return Err(ExportError::Sink(format!("Invalid export filename: {:?}", filename)));
        }

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| ExportError::Sink(format!("Failed to create export directory: {}", e)))?;

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| ExportError::Sink(format!("Failed to create temp file: {}", e)))?;
        tmp.write_all(bytes)
            .map_err(|e| ExportError::Sink(format!("Failed to write export: {}", e)))?;
        tmp.flush()
            .map_err(|e| ExportError::Sink(format!("Failed to flush export: {}", e)))?;

        let target = self.dir.join(filename);
        tmp.persist(&target)
            .map_err(|e| ExportError::Sink(format!("Failed to move export into place: {}", e)))?;

        debug!("Saved {} bytes to {}", bytes.len(), target.display());
        Ok(Some(target))
    }
}

/// Keeps payloads in memory, for hosts that stream the bytes themselves
#[derive(Default)]
pub struct MemorySink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything saved so far as `(filename, bytes)`
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn take_last(&self) -> Option<(String, Vec<u8>)> {
        self.saved.lock().ok().and_then(|mut s| s.pop())
    }
}

impl ExportSink for MemorySink {
    fn save(&self, bytes: &[u8], filename: &str) -> ExportResult<Option<PathBuf>> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| ExportError::Sink("Memory sink lock poisoned".to_string()))?;
        saved.push((filename.to_string(), bytes.to_vec()));
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("exports"));

        let path = sink.save(b"id\n1\n", "records_all.csv").unwrap().unwrap();
        assert_eq!(path, dir.path().join("exports").join("records_all.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"id\n1\n");

        // Overwrites an earlier export of the same name
        sink.save(b"id\n2\n", "records_all.csv").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"id\n2\n");
    }

    #[test]
    fn test_directory_sink_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        assert!(matches!(sink.save(b"x", "../escape.csv"), Err(ExportError::Sink(_))));
        assert!(matches!(sink.save(b"x", ""), Err(ExportError::Sink(_))));
    }

    #[test]
    fn test_memory_sink_keeps_payloads() {
        let sink = MemorySink::new();
        assert_eq!(sink.save(b"abc", "a.csv").unwrap(), None);
        sink.save(b"def", "b.csv").unwrap();
        assert_eq!(sink.saved().len(), 2);
        assert_eq!(sink.take_last(), Some(("b.csv".to_string(), b"def".to_vec())));
    }
}
