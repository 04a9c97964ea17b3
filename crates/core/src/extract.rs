// crates/core/src/extract.rs
//! Format-specific text extraction.
//!
//! [`FormatExtractor`] dispatches on the file extension:
//! - `.txt`, `.csv`, `.log`, `.md`: bytes taken verbatim (lossy UTF-8)
//! - `.html`, `.htm`: markup stripped, text nodes joined with whitespace
//! - `.docx`: paragraph text (feature `docx`)
//! - `.pdf`: plain text layer (feature `pdf`)
//!
//! Decoders run synchronously and may be slow or even panic on hostile input;
//! callers are expected to run them on a blocking thread behind a deadline.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::error::DecodeError;

/// How often (in text nodes) the HTML walker checks for cancellation.
const HTML_CANCEL_CHECK_EVERY: usize = 256;

/// Turns raw file bytes into plain text.
///
/// Implementations should poll `cancel` between units of work and return
/// [`DecodeError::Cancelled`] once it fires; the caller has already given up
/// on the result at that point.
pub trait Extractor: Send + Sync + 'static {
    fn extract(
        &self,
        file_name: &str,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<String, DecodeError>;
}

/// File formats recognised by [`FormatExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Html,
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, DecodeError> {
        let extension = extension_of(file_name);
        match extension.as_str() {
            ".txt" | ".csv" | ".log" | ".md" => Ok(Self::PlainText),
            ".html" | ".htm" => Ok(Self::Html),
            ".docx" if cfg!(feature = "docx") => Ok(Self::Docx),
            ".pdf" if cfg!(feature = "pdf") => Ok(Self::Pdf),
            _ => Err(DecodeError::UnsupportedFormat { extension }),
        }
    }
}

/// Lowercased extension including the leading dot, or `""` when absent.
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// The default extractor covering the formats in [`DocumentFormat`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FormatExtractor;

impl Extractor for FormatExtractor {
    fn extract(
        &self,
        file_name: &str,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<String, DecodeError> {
        let format = DocumentFormat::from_file_name(file_name)?;
        if cancel.is_cancelled() {
            return Err(DecodeError::Cancelled);
        }
        match format {
            DocumentFormat::PlainText => Ok(String::from_utf8_lossy(data).into_owned()),
            DocumentFormat::Html => extract_html(data, cancel),
            DocumentFormat::Docx => extract_docx(data, cancel),
            DocumentFormat::Pdf => extract_pdf(data, cancel),
        }
    }
}

/// Strip markup and concatenate every text node, each followed by a space.
pub fn extract_html(data: &[u8], cancel: &CancellationToken) -> Result<String, DecodeError> {
    let html = String::from_utf8_lossy(data);
    let document = scraper::Html::parse_document(&html);

    let mut content = String::with_capacity(html.len() / 2);
    for (i, text) in document.root_element().text().enumerate() {
        if i % HTML_CANCEL_CHECK_EVERY == 0 && cancel.is_cancelled() {
            return Err(DecodeError::Cancelled);
        }
        content.push_str(text);
        content.push(' ');
    }
    Ok(content)
}

#[cfg(feature = "docx")]
fn extract_docx(data: &[u8], cancel: &CancellationToken) -> Result<String, DecodeError> {
    let doc = docx_rs::read_docx(data).map_err(|e| DecodeError::malformed("docx", e))?;

    let mut content = String::new();
    for child in doc.document.children {
        if cancel.is_cancelled() {
            return Err(DecodeError::Cancelled);
        }
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            content.push_str(&t.text);
                        }
                    }
                }
            }
            content.push('\n');
        }
    }
    Ok(content)
}

#[cfg(not(feature = "docx"))]
fn extract_docx(_data: &[u8], _cancel: &CancellationToken) -> Result<String, DecodeError> {
    Err(DecodeError::UnsupportedFormat {
        extension: ".docx".into(),
    })
}

#[cfg(feature = "pdf")]
fn extract_pdf(data: &[u8], cancel: &CancellationToken) -> Result<String, DecodeError> {
    let content =
        pdf_extract::extract_text_from_mem(data).map_err(|e| DecodeError::malformed("pdf", e))?;
    // The decoder has no hook for cancellation; drop the result if the
    // deadline passed while it ran.
    if cancel.is_cancelled() {
        return Err(DecodeError::Cancelled);
    }
    Ok(content)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_data: &[u8], _cancel: &CancellationToken) -> Result<String, DecodeError> {
    Err(DecodeError::UnsupportedFormat {
        extension: ".pdf".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(file_name: &str, data: &[u8]) -> Result<String, DecodeError> {
        FormatExtractor.extract(file_name, data, &CancellationToken::new())
    }

    #[test]
    fn test_plain_text_formats_are_verbatim() {
        for name in ["a.txt", "b.CSV", "c.log", "notes.md"] {
            assert_eq!(extract(name, b"Hello World").unwrap(), "Hello World");
        }
    }

    #[test]
    fn test_invalid_utf8_is_lossy_not_an_error() {
        let text = extract("a.txt", b"ab\xffcd").unwrap();
        assert!(text.starts_with("ab"));
        assert!(text.ends_with("cd"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = extract("setup.exe", b"MZ").unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnsupportedFormat {
                extension: ".exe".into()
            }
        );
    }

    #[test]
    fn test_missing_extension_is_unsupported() {
        let err = extract("README", b"text").unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat { ref extension } if extension.is_empty()));
    }

    #[test]
    fn test_html_strips_markup() {
        let html = b"<html><head><title>T</title></head><body><p>Hello <b>World</b></p></body></html>";
        let text = extract("page.html", html).unwrap();
        assert!(!text.contains('<'));
        assert!(text.contains("Hello"));
        assert!(text.contains("World"));
        assert!(text.contains('T'));
    }

    #[test]
    fn test_html_honours_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = extract_html(b"<p>hi</p>", &cancel).unwrap_err();
        assert_eq!(err, DecodeError::Cancelled);
    }

    #[test]
    fn test_format_detection_is_case_insensitive() {
        assert_eq!(
            DocumentFormat::from_file_name("INDEX.HTM").unwrap(),
            DocumentFormat::Html
        );
        assert_eq!(
            DocumentFormat::from_file_name("archive.tar.txt").unwrap(),
            DocumentFormat::PlainText
        );
    }

    #[cfg(feature = "docx")]
    #[test]
    fn test_garbage_docx_is_malformed() {
        let err = extract("broken.docx", b"definitely not a zip").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { ref format, .. } if format == "docx"));
    }

    #[cfg(feature = "docx")]
    fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        use docx_rs::{Docx, Paragraph, Run};

        let mut docx = Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
        }
        let mut buf = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[cfg(feature = "docx")]
    #[test]
    fn test_docx_paragraph_text_is_extracted() {
        let data = build_docx(&["Hello World", "Second paragraph"]);
        let text = extract("report.DOCX", &data).unwrap();

        assert!(text.contains("Hello World"));
        assert!(text.contains("Second paragraph"));
        assert!(!text.contains('<'));
    }

    #[cfg(feature = "docx")]
    #[test]
    fn test_docx_honours_cancellation() {
        let data = build_docx(&["Hello"]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = extract_docx(&data, &cancel).unwrap_err();
        assert_eq!(err, DecodeError::Cancelled);
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_garbage_pdf_is_malformed() {
        let err = extract("scan.pdf", b"this is not a pdf file").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { ref format, .. } if format == "pdf"));
    }
}
