//! # Document summaries
//!
//! Extracts text from PDF, DOCX and plain text files and summarizes it chunk by
//! chunk. Whenever some text exists the caller gets a usable result: short
//! documents come back verbatim, and if every chunk fails to summarize the
//! opening of the document stands in for the summary.

use std::{
    io::Read,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use quick_xml::{escape::resolve_predefined_entity, events::Event, Reader};

use crate::Summarizer;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("File '{}' does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("Unsupported file format '{0}'. Use .pdf or .docx")]
    Unsupported(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(#[from] zip::result::ZipError),
    #[error("Malformed DOCX body: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "txt" | "md" => Ok(DocumentKind::PlainText),
            _ => Err(DocumentError::Unsupported(format!(".{ext}"))),
        }
    }
}

/// Extracts the text layer of a document. Blocking.
pub fn extract_text(path: &Path) -> Result<String, DocumentError> {
    match DocumentKind::from_path(path)? {
        DocumentKind::Pdf => {
            pdf_extract::extract_text(path).map_err(|e| DocumentError::Pdf(e.to_string()))
        }
        DocumentKind::Docx => {
            let file = std::fs::File::open(path)?;
            let mut archive = zip::ZipArchive::new(file)?;
            let mut xml = String::new();
            archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;
            docx_xml_to_text(&xml)
        }
        DocumentKind::PlainText => Ok(std::fs::read_to_string(path)?),
    }
}

/// Flattens a `word/document.xml` body to text, one line per paragraph.
///
/// Only `w:t` runs contribute text; `w:tab` and `w:br` become a tab and a newline.
pub fn docx_xml_to_text(xml: &str) -> Result<String, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_run => text.push_str(&String::from_utf8_lossy(&e)),
            Event::CData(e) if in_run => text.push_str(&String::from_utf8_lossy(&e)),
            Event::GeneralRef(e) if in_run => {
                if let Some(ch) = e.resolve_char_ref()? {
                    text.push(ch);
                } else {
                    let name = String::from_utf8_lossy(&e);
                    match resolve_predefined_entity(&name) {
                        Some(resolved) => text.push_str(resolved),
                        None => {
                            tracing::warn!(entity = %name, "Unknown entity in DOCX body");
                            text.push_str(&format!("&{name};"));
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text.trim_end().to_string())
}

/// Splits text into pieces of at most `max_chars` characters.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.trim().is_empty() || max_chars == 0 {
        tracing::warn!("Received empty text for chunking");
        return Vec::new();
    }

    text.chars()
        .chunks(max_chars)
        .into_iter()
        .map(|chunk| chunk.collect())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// `summarized` of `chunks` chunks produced a summary
    Summarized { chunks: usize, summarized: usize },
    /// Too little text to summarize, returned verbatim
    ShortText,
    /// Nothing extractable, a fixed notice is returned
    NoText,
    /// Every chunk failed, the opening of the document is returned
    Fallback,
}

#[derive(Debug, Clone)]
pub struct DocumentSummary {
    pub text: String,
    pub outcome: SummaryOutcome,
}

pub struct DocumentSummarizer<S: Summarizer> {
    summarizer: S,
    chunk_size: usize,
}

impl<S: Summarizer + Send + Sync> DocumentSummarizer<S> {
    pub const DEFAULT_CHUNK_SIZE: usize = 3000;
    const MIN_SUMMARY_CHARS: usize = 100;
    const FALLBACK_CHARS: usize = 1000;
    const LARGE_FILE_BYTES: u64 = 10 * 1024 * 1024;

    pub fn new(summarizer: S) -> Self {
        Self {
            summarizer,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Extracts and summarizes a file.
    ///
    /// Fails only for a missing file or an unsupported extension; extraction
    /// failures degrade to the no-text notice.
    #[tracing::instrument(skip(self))]
    pub async fn summarize_file(&self, path: &Path) -> Result<DocumentSummary, DocumentError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| DocumentError::NotFound(path.to_path_buf()))?;
        let kind = DocumentKind::from_path(path)?;

        tracing::info!(size_kb = metadata.len() / 1024, ?kind, "Processing file");
        if metadata.len() > Self::LARGE_FILE_BYTES {
            tracing::warn!(
                size_mb = metadata.len() / (1024 * 1024),
                "File is large, processing may take longer"
            );
        }

        let owned_path = path.to_path_buf();
        let raw_text = tokio::task::spawn_blocking(move || extract_text(&owned_path))
            .await
            .map_err(DocumentError::from)
            .and_then(|result| result)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to extract text from file");
                String::new()
            });

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown file".into());

        Ok(self.summarize_text(&name, &raw_text).await)
    }

    /// Summarizes already extracted text. `name` only appears in the no-text notice.
    #[tracing::instrument(skip(self, raw_text), fields(chars = raw_text.chars().count()))]
    pub async fn summarize_text(&self, name: &str, raw_text: &str) -> DocumentSummary {
        if raw_text.trim().is_empty() {
            tracing::warn!("No text could be extracted");
            return DocumentSummary {
                text: format!(
                    "This file ({name}) appears to contain no extractable text. It may consist of \
                     scanned images or graphics without text layers. Please consider using a \
                     text-based document for better analysis."
                ),
                outcome: SummaryOutcome::NoText,
            };
        }

        if raw_text.chars().count() < Self::MIN_SUMMARY_CHARS {
            tracing::warn!("Very little text extracted, returning it as is");
            return DocumentSummary {
                text: raw_text.to_string(),
                outcome: SummaryOutcome::ShortText,
            };
        }

        let chunks = chunk_text(raw_text, self.chunk_size);
        let chunk_count = chunks.len();
        tracing::info!(chunk_count, "Summarizing chunks");

        let mut summaries = Vec::with_capacity(chunk_count);
        for (i, chunk) in chunks.into_iter().enumerate() {
            let summary = if chunk.trim().chars().count() < Self::MIN_SUMMARY_CHARS {
                Ok(chunk)
            } else {
                self.summarizer
                    .summarize(&chunk)
                    .await
                    .map(|response| response.summary)
            };

            match summary {
                Ok(summary) if !summary.trim().is_empty() => summaries.push(summary),
                Ok(_) => tracing::warn!(chunk = i + 1, "Chunk returned empty summary"),
                Err(e) => tracing::error!(chunk = i + 1, error = %e, "Failed to summarize chunk"),
            }
        }

        if summaries.is_empty() {
            tracing::warn!("No summaries could be generated, using the start of the document");
            let opening = raw_text.chars().take(Self::FALLBACK_CHARS).collect::<String>();
            return DocumentSummary {
                text: format!("{opening}..."),
                outcome: SummaryOutcome::Fallback,
            };
        }

        let outcome = SummaryOutcome::Summarized {
            chunks: chunk_count,
            summarized: summaries.len(),
        };
        let text = summaries.join("\n\n");
        tracing::info!(chars = text.len(), "Final summary generated");

        DocumentSummary { text, outcome }
    }
}
