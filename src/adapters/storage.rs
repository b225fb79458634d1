use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::io::Write;
use std::path::Path;

/// Writes documents into a directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&full_path, data)?;
        Ok(full_path.display().to_string())
    }
}

/// Writes documents to standard output, one per line.
#[derive(Debug, Clone, Default)]
pub struct StdoutStorage;

impl Storage for StdoutStorage {
    async fn write_file(&self, _path: &str, data: &[u8]) -> Result<String> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(data)?;
        handle.write_all(b"\n")?;
        handle.flush()?;
        Ok("<stdout>".to_string())
    }
}

/// Output sink selected at runtime.
#[derive(Debug, Clone)]
pub enum OutputSink {
    Stdout(StdoutStorage),
    Local(LocalStorage),
}

impl OutputSink {
    pub fn from_output_dir(output_dir: Option<&str>) -> Self {
        match output_dir {
            Some(dir) => Self::Local(LocalStorage::new(dir.to_string())),
            None => Self::Stdout(StdoutStorage),
        }
    }
}

impl Storage for OutputSink {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        match self {
            Self::Stdout(storage) => storage.write_file(path, data).await,
            Self::Local(storage) => storage.write_file(path, data).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage_creates_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        let written = storage
            .write_file("snapshots/balances.json", b"{\"balances\":[]}")
            .await
            .unwrap();

        let full_path = temp_dir.path().join("snapshots/balances.json");
        assert_eq!(written, full_path.display().to_string());
        assert_eq!(std::fs::read(full_path).unwrap(), b"{\"balances\":[]}");
    }

    #[test]
    fn test_sink_selection() {
        assert!(matches!(OutputSink::from_output_dir(None), OutputSink::Stdout(_)));
        assert!(matches!(
            OutputSink::from_output_dir(Some("./out")),
            OutputSink::Local(_)
        ));
    }
}
