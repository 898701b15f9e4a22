//! File attachment as a `data:` URL

use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::session::UploadSink;

/// Read a file and encode it as `data:<mime>;base64,<payload>`
pub async fn read_data_url(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))?;

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(encode_data_url(mime.essence_str(), &bytes))
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Read `path` and hand it to the sink; the sink is untouched on failure
pub async fn attach_file<S: UploadSink + ?Sized>(sink: &mut S, path: &Path) -> Result<()> {
    let data_url = read_data_url(path).await?;
    tracing::debug!("attached {} ({} bytes encoded)", path.display(), data_url.len());
    sink.on_file_added(data_url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use std::io::Write;

    #[test]
    fn test_encode_data_url() {
        assert_eq!(encode_data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
    }

    #[tokio::test]
    async fn test_read_png_data_url() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G']).unwrap();

        let url = read_data_url(file.path()).await.unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_unknown_extension_is_octet_stream() {
        let mut file = tempfile::Builder::new().suffix(".zzq").tempfile().unwrap();
        file.write_all(b"abc").unwrap();

        let url = read_data_url(file.path()).await.unwrap();
        assert_eq!(url, "data:application/octet-stream;base64,YWJj");
    }

    #[tokio::test]
    async fn test_attach_missing_file_leaves_session() {
        let mut session = Session::new();
        session.on_file_added("data:text/plain;base64,eA==".to_string());

        let dir = tempfile::tempdir().unwrap();
        let result = attach_file(&mut session, &dir.path().join("nope.png")).await;

        assert!(result.is_err());
        assert_eq!(session.uploaded_image_data_url(), Some("data:text/plain;base64,eA=="));
    }

    #[tokio::test]
    async fn test_attach_sets_session() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"jpeg").unwrap();

        let mut session = Session::new();
        attach_file(&mut session, file.path()).await.unwrap();
        assert!(session.uploaded_image_data_url().unwrap().starts_with("data:image/jpeg;base64,"));
    }
}
