//! Tesseract CLI recognizer
//!
//! Runs `tesseract stdin stdout -l <langs> [--psm N] tsv` and rebuilds the text
//! from the word-level TSV rows. Page confidence is the mean of the positive
//! word confidences, scaled to [0, 1]. Pages are cleaned up with
//! [`Preprocessing`] first when it is configured.

use crate::preprocess::Preprocessing;
use async_trait::async_trait;
use shartnoma_domain::traits::{CollaboratorError, PageImage, PageRecognizer, RecognizedPage};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Default executable name
pub const DEFAULT_BINARY: &str = "tesseract";

/// Page recognizer backed by the tesseract executable
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    name: String,
    binary: String,
    psm: Option<u8>,
    preprocessing: Option<Preprocessing>,
}

impl TesseractRecognizer {
    /// Recognizer using `tesseract` from `PATH` with automatic page segmentation
    pub fn new() -> Self {
        Self {
            name: "tesseract".to_string(),
            binary: DEFAULT_BINARY.to_string(),
            psm: None,
            preprocessing: None,
        }
    }

    /// Clean up pages before recognition
    pub fn with_preprocessing(mut self, preprocessing: Option<Preprocessing>) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    /// Use a specific executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Force a page segmentation mode
    ///
    /// A second instance with `--psm 6` (uniform block) makes a useful secondary
    /// engine for pages where layout analysis fails.
    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = Some(psm);
        self.name = format!("tesseract-psm{}", psm);
        self
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn recognize(&self, image: &PageImage, languages: &str) -> Result<RecognizedPage, CollaboratorError> {
        let data = match self.preprocessing {
            Some(preprocessing) => prepare(preprocessing, image).await,
            None => image.data.clone(),
        };

        let mut command = Command::new(&self.binary);
        command.arg("stdin").arg("stdout").arg("-l").arg(languages);
        if let Some(psm) = self.psm {
            command.arg("--psm").arg(psm.to_string());
        }
        command
            .arg("tsv")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CollaboratorError::Unavailable(format!("{} not installed", self.binary))
            } else {
                CollaboratorError::Failed(format!("Cannot start {}: {}", self.binary, e))
            }
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&data)
                .await
                .map_err(|e| CollaboratorError::Failed(format!("Cannot write page image: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CollaboratorError::Failed(format!("{} did not finish: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorError::Failed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        let page = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(
            "{} page {}: {} chars, confidence {:.2}",
            self.name,
            image.page,
            page.text.len(),
            page.confidence
        );
        Ok(page)
    }
}

/// Preprocessed page, or the original bytes when the image cannot be decoded
async fn prepare(preprocessing: Preprocessing, image: &PageImage) -> Vec<u8> {
    let raw = image.data.clone();
    let page = image.page;
    let cleaned = tokio::task::spawn_blocking(move || preprocessing.apply(&raw).map_err(|e| e.to_string())).await;
    match cleaned {
        Ok(Ok(data)) => data,
        Ok(Err(e)) => {
            warn!("Page {} sent without preprocessing: {}", page, e);
            image.data.clone()
        }
        Err(e) => {
            warn!("Page {} preprocessing aborted: {}", page, e);
            image.data.clone()
        }
    }
}

/// Rebuild text and confidence from tesseract TSV output
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left, top,
/// width, height, conf, text. Only word rows (level 5) carry text.
pub fn parse_tsv(tsv: &str) -> RecognizedPage {
    let mut text = String::new();
    let mut confidences: Vec<f32> = Vec::new();
    let mut current_line: Option<(u32, u32, u32)> = None;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }
        let key = (
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );

        match current_line {
            Some(line) if line == key => text.push(' '),
            Some(_) => text.push('\n'),
            None => {}
        }
        current_line = Some(key);
        text.push_str(word);

        if let Ok(conf) = cols[10].trim().parse::<f32>() {
            if conf > 0.0 {
                confidences.push(conf);
            }
        }
    }

    let confidence = if confidences.is_empty() {
        0.0
    } else {
        (confidences.iter().sum::<f32>() / confidences.len() as f32 / 100.0).clamp(0.0, 1.0)
    };

    RecognizedPage { text, confidence }
}
