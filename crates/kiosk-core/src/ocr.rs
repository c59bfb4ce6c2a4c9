//! OCR engine seam and text cleanup for ID-card names.
//!
//! The production engine shells out to the `tesseract` binary, piping a PNG on
//! stdin and reading plain text from stdout.

use image::{GrayImage, ImageFormat};
use regex::Regex;
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("tesseract binary not found: {0}")]
    EngineMissing(String),
    #[error("tesseract failed: {0}")]
    Failed(String),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Tesseract page segmentation modes used for ID cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSegMode {
    /// `--psm 7`: treat the image as a single text line.
    SingleLine,
    /// `--psm 6`: assume a single uniform block of text.
    UniformBlock,
}

impl PageSegMode {
    pub fn psm(self) -> u8 {
        match self {
            PageSegMode::SingleLine => 7,
            PageSegMode::UniformBlock => 6,
        }
    }
}

/// Recognizes raw text in a preprocessed grayscale image.
pub trait OcrEngine {
    fn recognize(&self, image: &GrayImage, mode: PageSegMode) -> Result<String, OcrError>;
}

/// Tesseract command-line engine (`--oem 3`, LSTM + legacy).
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: String,
    lang: String,
}

impl TesseractCli {
    pub fn new(program: impl Into<String>, lang: impl Into<String>) -> Self {
        Self { program: program.into(), lang: lang.into() }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &GrayImage, mode: PageSegMode) -> Result<String, OcrError> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let psm = mode.psm().to_string();
        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "--psm", &psm, "--oem", "3", "-l", &self.lang])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OcrError::EngineMissing(self.program.clone()),
                _ => OcrError::Io(e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&png)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(OcrError::Failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        tracing::debug!(psm = mode.psm(), bytes = output.stdout.len(), "tesseract finished");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn non_alpha() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z\s]").expect("static regex"))
}

/// Strip everything but ASCII letters and whitespace, upper-case, and
/// collapse whitespace runs to single spaces.
pub fn clean_text(text: &str) -> String {
    let letters = non_alpha().replace_all(text, "");
    letters
        .split_whitespace()
        .map(|w| w.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when the alphanumeric characters of `text` are non-empty and all digits.
pub fn is_numeric_id(text: &str) -> bool {
    let mut alnum = text.chars().filter(|c| c.is_alphanumeric()).peekable();
    alnum.peek().is_some() && alnum.all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_digits_and_punctuation() {
        assert_eq!(clean_text("J0HN D0E!!"), "JHN DE");
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  juan\n\tperez  \n"), "JUAN PEREZ");
        assert_eq!(clean_text("Ana - 42 - Lopez"), "ANA LOPEZ");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("1234 !!"), "");
    }

    #[test]
    fn test_is_numeric_id() {
        assert!(is_numeric_id("101"));
        assert!(is_numeric_id("10-1"));
        assert!(!is_numeric_id("Carlos"));
        assert!(!is_numeric_id("101a"));
        assert!(!is_numeric_id(""));
        assert!(!is_numeric_id("--"));
    }

    #[test]
    fn test_psm_values() {
        assert_eq!(PageSegMode::SingleLine.psm(), 7);
        assert_eq!(PageSegMode::UniformBlock.psm(), 6);
    }

    #[test]
    fn test_missing_binary_is_engine_missing() {
        let engine = TesseractCli::new("/nonexistent/tesseract-binary", "eng");
        let image = GrayImage::new(8, 8);
        let err = engine.recognize(&image, PageSegMode::SingleLine).unwrap_err();
        assert!(matches!(err, OcrError::EngineMissing(_)), "got {err:?}");
    }
}
