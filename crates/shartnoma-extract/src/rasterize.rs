//! PDF rasterization through poppler's `pdftoppm`

use async_trait::async_trait;
use shartnoma_domain::traits::{CollaboratorError, PageImage, PageRasterizer};
use tokio::process::Command;
use tracing::{debug, warn};

/// Default executable name
pub const DEFAULT_BINARY: &str = "pdftoppm";

/// Renders PDF pages to PNG in a scratch directory
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: String,
}

impl PdftoppmRasterizer {
    /// Rasterizer using `pdftoppm` from `PATH`
    pub fn new() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
        }
    }

    /// Use a specific executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Page number from a pdftoppm output name (`page-7.png`, `page-007.png`)
fn page_number(file_name: &str) -> Option<usize> {
    let stem = file_name.strip_suffix(".png")?;
    let (_, number) = stem.rsplit_once('-')?;
    number.parse().ok()
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(
        &self,
        pdf: &[u8],
        first_page: usize,
        last_page: usize,
        dpi: u32,
    ) -> Result<Vec<PageImage>, CollaboratorError> {
        let scratch = tempfile::tempdir()
            .map_err(|e| CollaboratorError::Failed(format!("Cannot create scratch dir: {}", e)))?;
        let input = scratch.path().join("input.pdf");
        tokio::fs::write(&input, pdf)
            .await
            .map_err(|e| CollaboratorError::Failed(format!("Cannot write PDF: {}", e)))?;
        let prefix = scratch.path().join("page");

        let output = Command::new(&self.binary)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(first_page.to_string())
            .arg("-l")
            .arg(last_page.to_string())
            .arg("-png")
            .arg(&input)
            .arg(&prefix)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CollaboratorError::Unavailable(format!("{} not installed", self.binary))
                } else {
                    CollaboratorError::Failed(format!("Cannot start {}: {}", self.binary, e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorError::Failed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        let mut images = Vec::new();
        let mut entries = tokio::fs::read_dir(scratch.path())
            .await
            .map_err(|e| CollaboratorError::Failed(format!("Cannot list scratch dir: {}", e)))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CollaboratorError::Failed(format!("Cannot list scratch dir: {}", e)))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(page) = page_number(&name) else {
                continue;
            };
            match tokio::fs::read(entry.path()).await {
                Ok(data) => images.push(PageImage { page, data }),
                Err(e) => warn!("Cannot read rendered page {}: {}", page, e),
            }
        }
        images.sort_by_key(|image| image.page);

        debug!(
            "Rasterized pages {}-{} at {} dpi: {} images",
            first_page,
            last_page,
            dpi,
            images.len()
        );
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_parsing() {
        assert_eq!(page_number("page-7.png"), Some(7));
        assert_eq!(page_number("page-007.png"), Some(7));
        assert_eq!(page_number("input.pdf"), None);
        assert_eq!(page_number("page.png"), None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let rasterizer = PdftoppmRasterizer::new().with_binary("/nonexistent/pdftoppm-binary");
        let err = rasterizer.rasterize(b"%PDF", 1, 1, 300).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Unavailable(_)));
    }
}
