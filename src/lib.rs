//! # Thumbsmith
//!
//! A single-binary HTTP thumbnail service. One endpoint, `/thumbnail`, accepts
//! an image — either a remote URL or a multipart file upload — shrinks it to
//! fit the requested bounds, and returns the JPEG result inline as a base64
//! data URI together with the image's embedded EXIF tag table:
//!
//! ```text
//! { "thumbnailUrl": "data:image/jpeg;base64,...", "metadata": { "Make": "...", ... } }
//! ```
//!
//! # Request Flow
//!
//! ```text
//! parse form fields → resolve source (fetch URL | save upload)
//!                   → render thumbnail (decode, shrink, JPEG encode)
//!                   → read EXIF tag table (independent decode, non-fatal)
//!                   → respond; URL-sourced temp files are removed on drop
//! ```
//!
//! Image sources always pass through a file in the uploads directory: uploads
//! are kept there after the response, URL downloads are temporary and removed
//! by a drop guard. CPU-bound image work runs on the blocking thread pool so
//! request handling never stalls the async executor.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`server`] | Route registration, form-field parsing, the `/thumbnail` handler |
//! | [`source`] | Image-source resolution: URL fetch, upload persistence, temp-file guard |
//! | [`imaging`] | Pure image work: fit calculations, thumbnail rendering, EXIF extraction |
//! | [`naming`] | Filename sanitization and content-hashed storage keys |
//! | [`config`] | Explicit [`ServiceConfig`](config::ServiceConfig) passed to handlers |
//! | [`error`] | [`ApiError`](error::ApiError) taxonomy and its JSON error responses |
//!
//! # Design Decisions
//!
//! ## Inline Thumbnails
//!
//! The thumbnail is returned as a `data:image/jpeg;base64,` URI rather than a
//! retrievable URL. The service keeps no thumbnail storage and no cache; every
//! response is self-contained and the only persistent artifacts are the
//! uploaded originals.
//!
//! ## Content-Hashed Storage Keys
//!
//! Files land in a flat shared uploads directory. Client-supplied names and
//! URL basenames are sanitized and suffixed with a SHA-256 content prefix, so
//! concurrent requests with colliding names cannot overwrite each other while
//! the stored names stay recognizable.
//!
//! ## Non-Fatal Metadata
//!
//! EXIF extraction distinguishes "image carries no tags" from "extraction
//! failed" internally, but neither ever fails a request: the boundary
//! collapses both to an empty mapping and logs the failure case.

pub mod config;
pub mod error;
pub mod imaging;
pub mod naming;
pub mod server;
pub mod source;
