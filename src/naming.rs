//! Filename sanitization and storage-key generation.
//!
//! Everything written to the uploads directory goes through this module.
//! Client-supplied filenames and URL basenames are untrusted: they may carry
//! path components, control characters, or nothing usable at all. Sanitized
//! names are additionally suffixed with a SHA-256 content prefix so that two
//! requests storing different content under the same name cannot overwrite
//! each other in the flat shared directory.

use sha2::{Digest, Sha256};
use url::Url;

/// Stem used when sanitization leaves nothing usable.
const FALLBACK_STEM: &str = "image";

/// Number of hex characters of the content hash included in storage keys.
const HASH_PREFIX_LEN: usize = 8;

/// Sanitize an untrusted filename for use inside the uploads directory.
///
/// Keeps only ASCII alphanumerics, `.`, `-` and `_`; spaces become
/// underscores, everything else is dropped. Path separators are handled by
/// keeping only the final component, and leading/trailing dots are stripped
/// so the result can never be a dotfile or traverse upward. An empty result
/// falls back to `"image"`.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let mut out = String::with_capacity(base.len());
    for ch in base.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
            out.push(ch);
        } else if ch == ' ' {
            out.push('_');
        }
    }

    let trimmed = out.trim_matches('.');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build a request-unique storage key from a sanitized name and the content
/// it will hold: `stem-<hash8>.ext` (or `name-<hash8>` without an extension).
pub fn storage_key(sanitized: &str, content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let hash = format!("{:x}", digest);
    let tag = &hash[..HASH_PREFIX_LEN];

    match sanitized.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{stem}-{tag}.{ext}")
        }
        _ => format!("{sanitized}-{tag}"),
    }
}

/// Extract and sanitize the base name of a URL's path.
///
/// `https://example.com/a/b/photo.jpg?x=1` → `photo.jpg`. URLs whose path
/// has no usable final segment fall back to `"image"`.
pub fn url_base_name(url: &Url) -> String {
    let base = url
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .unwrap_or(FALLBACK_STEM);
    sanitize_file_name(base)
}
