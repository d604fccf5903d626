use crate::catalog::Catalog;
use futures_util::StreamExt;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default catalog location, relative to the working directory.
pub const DEFAULT_SOURCE: &str = "roms.json";

/// Where the catalog is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Url(String),
}

impl CatalogSource {
    /// `http://` / `https://` means a URL, anything else a path.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            CatalogSource::Url(raw.to_string())
        } else {
            CatalogSource::File(PathBuf::from(raw))
        }
    }
}

impl Default for CatalogSource {
    fn default() -> Self {
        CatalogSource::File(PathBuf::from(DEFAULT_SOURCE))
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::File(p) => write!(f, "{}", p.display()),
            CatalogSource::Url(u) => f.write_str(u),
        }
    }
}

/// Everything that can stop the catalog from loading. All variants end up on
/// the same user-visible failure path; only the message differs.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Не удалось загрузить данные (HTTP {status})")]
    Status { status: u16 },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl LoadError {
    /// Message shown in place of the loading indicator.
    pub fn user_message(&self) -> String {
        match self {
            LoadError::Status { status } => {
                format!("Не удалось загрузить данные (HTTP {status})")
            }
            LoadError::Http(e) => format!("Network error: {e}"),
            LoadError::Io { path, source } => {
                format!("Cannot read {}: {source}", path.display())
            }
            LoadError::Parse(e) => format!("Data format error: {e}"),
        }
    }
}

/// Progress callback: bytes received so far.
pub type ProgressFn<'a> = &'a (dyn Fn(u64) + Sync);

/// Fetch and parse the catalog once. No retry.
pub async fn load(source: &CatalogSource, progress: ProgressFn<'_>) -> Result<Catalog, LoadError> {
    let bytes = match source {
        CatalogSource::File(path) => {
            let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            progress(bytes.len() as u64);
            bytes
        }
        CatalogSource::Url(url) => fetch(url, progress).await?,
    };
    let catalog = parse(&bytes)?;
    log::info!("loaded {} catalog records from {source}", catalog.roms.len());
    Ok(catalog)
}

pub fn parse(bytes: &[u8]) -> Result<Catalog, LoadError> {
    Ok(serde_json::from_slice(bytes)?)
}

async fn fetch(url: &str, progress: ProgressFn<'_>) -> Result<Vec<u8>, LoadError> {
    log::debug!("GET {url}");
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            status: status.as_u16(),
        });
    }

    let mut body = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk?);
        progress(body.len() as u64);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_progress(_: u64) {}

    #[test]
    fn test_source_parse() {
        assert_eq!(
            CatalogSource::parse("https://example.org/roms.json"),
            CatalogSource::Url("https://example.org/roms.json".to_string())
        );
        assert_eq!(
            CatalogSource::parse("data/roms.json"),
            CatalogSource::File(PathBuf::from("data/roms.json"))
        );
        assert_eq!(CatalogSource::default().to_string(), "roms.json");
    }

    #[tokio::test]
    async fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"roms":[{{"family":"LineageOS","android":14,"versions":[{{"name":"21.0","date":"2024-01-01","links":[{{"name":"SF","url":"https://sf.example"}}]}}]}}]}}"#
        )
        .unwrap();

        let source = CatalogSource::File(file.path().to_path_buf());
        let catalog = load(&source, &no_progress).await.unwrap();
        assert_eq!(catalog.roms.len(), 1);
        assert_eq!(catalog.roms[0].platform_version, "14");
        assert_eq!(catalog.roms[0].versions[0].links[0].name, "SF");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = CatalogSource::File(dir.path().join("nope.json"));
        let err = load(&source, &no_progress).await.unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.user_message().contains("nope.json"));
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"roms\": [").unwrap();
        let source = CatalogSource::File(file.path().to_path_buf());
        let err = load(&source, &no_progress).await.unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
        assert!(err.user_message().starts_with("Data format error"));
    }

    /// Serve one canned HTTP response on a loopback port, return its URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/roms.json")
    }

    #[tokio::test]
    async fn test_http_status_failure() {
        let url = serve_once("404 Not Found", "not here").await;
        let source = CatalogSource::parse(&url);
        let err = load(&source, &no_progress).await.unwrap_err();
        assert!(matches!(err, LoadError::Status { status: 404 }));
        assert_eq!(err.user_message(), "Не удалось загрузить данные (HTTP 404)");
    }

    #[tokio::test]
    async fn test_http_load() {
        let url = serve_once(
            "200 OK",
            r#"{"roms":[{"family":"crDroid","android":"13","versions":[{"name":"9.10"},{"name":"9.11"}]}]}"#,
        )
        .await;
        let received = std::sync::atomic::AtomicU64::new(0);
        let progress = |bytes: u64| received.store(bytes, std::sync::atomic::Ordering::Relaxed);

        let catalog = load(&CatalogSource::parse(&url), &progress).await.unwrap();
        assert_eq!(catalog.roms.len(), 1);
        assert_eq!(catalog.roms[0].platform_version, "13");
        assert_eq!(crate::catalog::count_entries(&catalog), 2);
        assert!(received.load(std::sync::atomic::Ordering::Relaxed) > 0);
    }
}
