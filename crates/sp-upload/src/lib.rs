//! stockpush uploads
//!
//! Replays a signed-in browser session and pushes enriched images to a stock
//! platform:
//! - [`PageDriver`]: the browser seam, with [`WebDriverClient`] for real runs
//! - [`SessionCookies`]: cookies exported from a signed-in browser
//! - [`UploadMacro`]: platform flows ([`GettyEspMacro`], [`PexelsMacro`])
//! - [`UploadOrchestrator`]: the batch sequence and its [`UploadReport`]
//!
//! # Example
//!
//! ```rust,ignore
//! use sp_upload::{GettyEspMacro, SessionCookies, UploadOrchestrator, WebDriverClient, WebDriverConfig};
//!
//! let driver = WebDriverClient::connect(&WebDriverConfig::default()).await?;
//! let cookies = SessionCookies::load("./cookies/esp.gettyimages.com.cookies.json").await?;
//! let report = UploadOrchestrator::new(driver)
//!     .upload(&cookies, &GettyEspMacro::default(), &records)
//!     .await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod driver;
pub mod error;
pub mod macros;
pub mod orchestrator;
pub mod session;
pub mod wait;
pub mod webdriver;

pub use driver::{Cookie, ElementRef, PageDriver};
pub use error::{DriverError, UploadError};
pub use macros::{
    completion_selector, GettyEspConfig, GettyEspMacro, PexelsConfig, PexelsMacro, UploadMacro,
};
pub use orchestrator::{UploadFailure, UploadOrchestrator, UploadReport};
pub use session::SessionCookies;
pub use wait::{require, wait_for, wait_gone, WaitConfig};
pub use webdriver::{WebDriverClient, WebDriverConfig};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
