//! Manifest verification
//!
//! Checks that a result set described by a remote XML manifest arrived intact:
//! every listed file must exist in the local analysis folder and, when a digest
//! is supplied, the normalized manifest must hash to it.

mod document;
mod error;
mod fetch;
mod folder;
mod normalize;
mod verifier;

pub use document::{parse_manifest, FileEntry, Manifest};
pub use error::VerifyError;
pub use fetch::{HttpManifestSource, ManifestSource};
pub use folder::{folder_from_url, FolderResolver, MarkerFolder};
pub use normalize::{digest_hex, normalize, NORMALIZED_SECOND_LINE};
pub use verifier::{DigestCheck, ManifestVerifier, VerificationReport};
