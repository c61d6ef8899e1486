use std::path::Path;

#[derive(Clone, Debug)]
pub struct Client {}

impl Client {
    pub fn new() -> Self {
        Self {}
    }

    /// Reads the whole file; the handle is closed before this returns.
    pub async fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>, std::io::Error> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "read file");
        Ok(content)
    }
}

#[tokio::test]
async fn test_read_returns_exact_bytes() {
    use std::io::Write;

    let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&bytes).unwrap();
    tmp.flush().unwrap();

    let got = Client::new().read(tmp.path()).await.unwrap();
    assert_eq!(got, bytes);
}

#[tokio::test]
async fn test_read_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Client::new()
        .read(dir.path().join("missing.zip"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
