//! Legacy `.doc` conversion through external tools
//!
//! Binary Word documents are handed to the first installed converter:
//! `antiword`, then `catdoc`, then LibreOffice in headless mode.

use crate::error::ExtractError;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// OLE2 compound file signature shared by every `.doc`
const OLE_SIGNATURE: &[u8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Converters in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocTool {
    /// `antiword <file>` prints the text
    Antiword,
    /// `catdoc <file>` prints the text
    Catdoc,
    /// `libreoffice --headless --convert-to txt:Text` writes a `.txt` file
    LibreOffice,
}

impl DocTool {
    fn default_binary(&self) -> &'static str {
        match self {
            DocTool::Antiword => "antiword",
            DocTool::Catdoc => "catdoc",
            DocTool::LibreOffice => "libreoffice",
        }
    }
}

/// Outcome of one converter attempt
enum Attempt {
    Text(String),
    Missing,
    Failed(String),
}

/// Converts `.doc` bytes to text with the first converter available
#[derive(Debug, Clone)]
pub struct DocConverter {
    tools: Vec<(DocTool, String)>,
    timeout: Duration,
}

impl Default for DocConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocConverter {
    /// Converter trying the system tools from `PATH`
    pub fn new() -> Self {
        Self {
            tools: [DocTool::Antiword, DocTool::Catdoc, DocTool::LibreOffice]
                .into_iter()
                .map(|tool| (tool, tool.default_binary().to_string()))
                .collect(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Use exactly these tools, in order
    pub fn with_tools(mut self, tools: Vec<(DocTool, String)>) -> Self {
        self.tools = tools;
        self
    }

    /// Timeout for one converter run
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Convert a `.doc` to plain text
    ///
    /// `UnsupportedFormat` when no converter is installed, `CorruptDocument` when
    /// the bytes are not a compound file or every installed converter failed.
    pub async fn convert(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        if !bytes.starts_with(OLE_SIGNATURE) {
            return Err(ExtractError::CorruptDocument(
                "Not a Word 97-2003 compound file".to_string(),
            ));
        }

        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("input.doc");
        tokio::fs::write(&input, bytes).await?;

        let mut failures = Vec::new();
        for (tool, binary) in &self.tools {
            match self.run(*tool, binary, &input, scratch.path()).await {
                Attempt::Text(text) => {
                    debug!("{} converted .doc: {} chars", binary, text.len());
                    return Ok(text.replace("\r\n", "\n").trim().to_string());
                }
                Attempt::Missing => debug!("{} not installed", binary),
                Attempt::Failed(reason) => {
                    warn!("{} could not convert .doc: {}", binary, reason);
                    failures.push(format!("{}: {}", binary, reason));
                }
            }
        }

        if failures.is_empty() {
            Err(ExtractError::UnsupportedFormat(
                "Legacy .doc needs antiword, catdoc or libreoffice installed".to_string(),
            ))
        } else {
            Err(ExtractError::CorruptDocument(failures.join("; ")))
        }
    }

    async fn run(&self, tool: DocTool, binary: &str, input: &Path, scratch: &Path) -> Attempt {
        let mut command = Command::new(binary);
        match tool {
            DocTool::Antiword | DocTool::Catdoc => {
                command.arg(input);
            }
            DocTool::LibreOffice => {
                command
                    .arg("--headless")
                    .arg("--convert-to")
                    .arg("txt:Text")
                    .arg("--outdir")
                    .arg(scratch)
                    .arg(input);
            }
        }
        command.kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => return Attempt::Missing,
            Ok(Err(e)) => return Attempt::Failed(format!("cannot start: {}", e)),
            Err(_) => return Attempt::Failed(format!("no result within {:?}", self.timeout)),
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Attempt::Failed(format!("exited with {}: {}", output.status, stderr.trim()));
        }

        let text = match tool {
            DocTool::Antiword | DocTool::Catdoc => String::from_utf8_lossy(&output.stdout).into_owned(),
            DocTool::LibreOffice => match tokio::fs::read(scratch.join("input.txt")).await {
                Ok(data) => String::from_utf8_lossy(&data).into_owned(),
                Err(e) => return Attempt::Failed(format!("no text output: {}", e)),
            },
        };
        if text.trim().is_empty() {
            return Attempt::Failed("empty output".to_string());
        }
        Attempt::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ole(body: &str) -> Vec<u8> {
        let mut bytes = OLE_SIGNATURE.to_vec();
        bytes.extend_from_slice(body.as_bytes());
        bytes
    }

    #[tokio::test]
    async fn test_no_converter_installed_is_unsupported() {
        let converter = DocConverter::new().with_tools(vec![
            (DocTool::Antiword, "/nonexistent/antiword".to_string()),
            (DocTool::Catdoc, "/nonexistent/catdoc".to_string()),
        ]);
        let err = converter.convert(&ole("matn")).await.unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_wrong_signature_is_corrupt() {
        let err = DocConverter::new().convert(b"PK\x03\x04").await.unwrap_err();
        assert!(matches!(err, ExtractError::CorruptDocument(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_first_working_tool_wins() {
        // `cat` stands in for a converter that prints the file
        let converter = DocConverter::new().with_tools(vec![
            (DocTool::Antiword, "/nonexistent/antiword".to_string()),
            (DocTool::Catdoc, "cat".to_string()),
        ]);
        let text = converter.convert(&ole("\nSHARTNOMA\r\n1. Predmet\n")).await.unwrap();
        assert!(text.ends_with("SHARTNOMA\n1. Predmet"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_tool_is_corrupt() {
        let converter = DocConverter::new().with_tools(vec![(DocTool::Antiword, "false".to_string())]);
        let err = converter.convert(&ole("x")).await.unwrap_err();
        assert!(matches!(err, ExtractError::CorruptDocument(_)));
    }
}
