//! stockpush records
//!
//! The [`ImageRecord`] entity and the collaborators that create and describe
//! it before any remote service is involved:
//! - [`discover`]: scan a folder for image files
//! - [`apply_metadata`]: fill width, height and byte size
//! - [`load_data_uri`]: read an image as a base64 `data:` URI
//!
//! # Example
//!
//! ```rust,ignore
//! use sp_record::{discover, DiscoveryConfig};
//!
//! let records = discover(&DiscoveryConfig::new("./img/toUpload")).await?;
//! for record in &records {
//!     println!("{}", record.path().display());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod discovery;
pub mod error;
pub mod metadata;
pub mod record;

pub use discovery::{discover, DiscoveryConfig, ExtensionMatch, OBSERVED_EXTENSIONS};
pub use error::RecordError;
pub use metadata::{apply_metadata, load_data_uri, read_metadata, ImageMetadata};
pub use record::{data_uri, ImageRecord};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
