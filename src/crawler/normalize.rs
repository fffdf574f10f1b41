//! Content normalization
//!
//! Turns a fetched body into the canonical text that gets checksummed and
//! stored. PDFs are reduced to the text of their pages; everything else is
//! decoded to UTF-8 using the charset the server or the page declared.
//!
//! Normalization never fails outward. An unreadable PDF becomes
//! [`EXTRACTION_FAILED`] so the crawl still settles on an outcome.

use encoding_rs::{Encoding, UTF_8};
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

/// Snapshot text stored when a PDF cannot be read
pub const EXTRACTION_FAILED: &str = "extraction failed";

/// How far into a body to look for a `<meta>` charset declaration
const META_SNIFF_LIMIT: usize = 1024;

#[derive(Debug, Error)]
enum NormalizationFailure {
    #[error("PDF parse error: {0}")]
    Pdf(String),

    #[error("PDF extractor panicked")]
    Panicked,
}

/// Returns true if the Content-Type names a PDF (case-insensitive substring)
pub fn is_pdf(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("pdf")
}

/// Produces the canonical UTF-8 text for a fetched body
///
/// # Arguments
///
/// * `body` - Raw response bytes
/// * `content_type` - Content-Type header value, possibly empty
pub fn normalize(body: &[u8], content_type: &str) -> String {
    if is_pdf(content_type) {
        match extract_pdf_text(body) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("{}; storing sentinel text", e);
                EXTRACTION_FAILED.to_string()
            }
        }
    } else {
        decode_text(body, content_type)
    }
}

/// Concatenates the text of every page, in page order
fn extract_pdf_text(body: &[u8]) -> Result<String, NormalizationFailure> {
    // The extractor can panic on malformed documents
    let pages = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(body)
    }))
    .map_err(|_| NormalizationFailure::Panicked)?
    .map_err(|e| NormalizationFailure::Pdf(e.to_string()))?;

    Ok(pages.concat())
}

/// Decodes a text body to UTF-8
///
/// Precedence: BOM, then the Content-Type charset, then a `<meta>` charset
/// near the top of the body, then UTF-8. Invalid sequences become U+FFFD.
fn decode_text(body: &[u8], content_type: &str) -> String {
    let encoding = charset_label(content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| {
            meta_charset(body)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
                .map(Encoding::output_encoding)
        })
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

/// Extracts the `charset` parameter from a Content-Type value
fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Finds a charset declared by a `<meta>` tag in the first bytes of a page
///
/// Covers both `<meta charset="...">` and the `http-equiv` form, whose
/// `content` attribute carries a Content-Type value.
fn meta_charset(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(META_SNIFF_LIMIT)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    head.split("<meta").skip(1).find_map(|tag| {
        let tag = tag.split('>').next()?;
        let (_, rest) = tag.split_once("charset")?;
        let value = rest.trim_start().strip_prefix('=')?.trim_start();
        let label: String = value
            .trim_start_matches(|c| c == '"' || c == '\'')
            .chars()
            .take_while(|&c| {
                c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
            })
            .collect();
        (!label.is_empty()).then_some(label)
    })
}
