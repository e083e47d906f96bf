//! Per-platform upload macros
//!
//! A macro knows where a platform's upload flow starts and which elements to
//! drive. Every element is awaited with [`wait_for`], so a page that never
//! shows an expected element fails the step instead of being skipped over.
//!
//! A push only counts once the page shows an element naming the pushed file,
//! built from a completion template where `{file_name}` stands for the file.

use crate::driver::PageDriver;
use crate::error::UploadError;
use crate::wait::{require, wait_for, wait_gone, WaitConfig};
use serde::{Deserialize, Serialize};
use sp_record::ImageRecord;
use std::path::{Path, PathBuf};

/// Placeholder replaced by the file name in completion templates
pub const FILE_NAME_PLACEHOLDER: &str = "{file_name}";

/// A platform's upload flow
#[async_trait::async_trait]
pub trait UploadMacro: Send + Sync {
    /// Platform name for logs
    fn name(&self) -> &str;

    /// Page opened first so cookies can be set for the platform domain
    fn landing_url(&self) -> &str;

    /// Page the upload flow starts from, opened after cookies are set
    fn start_url(&self) -> &str;

    /// One-time setup before any file is pushed
    async fn prepare(&self, driver: &dyn PageDriver) -> Result<(), UploadError>;

    /// Upload one file and wait until the page confirms it
    async fn push(&self, driver: &dyn PageDriver, record: &ImageRecord)
        -> Result<(), UploadError>;
}

/// Fill a completion template with a file name
///
/// The name is escaped for use inside a double-quoted CSS string.
#[must_use]
pub fn completion_selector(template: &str, file_name: &str) -> String {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    template.replace(FILE_NAME_PLACEHOLDER, &escaped)
}

/// Absolute path of the record's file
///
/// Browser drivers resolve file inputs on their own side and reject
/// relative paths.
async fn local_file(record: &ImageRecord) -> Result<PathBuf, UploadError> {
    let path = record.path();
    tokio::fs::canonicalize(&path)
        .await
        .map_err(|source| UploadError::LocalFile { path, source })
}

async fn click_when_ready(
    driver: &dyn PageDriver,
    step: &str,
    selector: &str,
    wait: &WaitConfig,
) -> Result<(), UploadError> {
    let element = wait_for(driver, step, selector, wait).await?;
    driver
        .click(&element)
        .await
        .map_err(|e| UploadError::driver(step, e))
}

async fn send_when_ready(
    driver: &dyn PageDriver,
    step: &str,
    selector: &str,
    file: &Path,
    wait: &WaitConfig,
) -> Result<(), UploadError> {
    let input = wait_for(driver, step, selector, wait).await?;
    driver
        .send_file(&input, file)
        .await
        .map_err(|e| UploadError::driver(step, e))
}

/// Wait out the progress indicator, then for the file's own completion mark
async fn await_completion(
    driver: &dyn PageDriver,
    progress_selector: &str,
    done_selector: &str,
    wait: &WaitConfig,
) -> Result<(), UploadError> {
    wait_gone(driver, "upload in flight", progress_selector, wait).await?;
    wait_for(driver, "upload completion", done_selector, wait)
        .await
        .map(drop)
}

/// Getty Images contributor portal settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GettyEspConfig {
    pub landing_url: String,
    pub batches_url: String,
    pub create_batch_selector: String,
    pub confirm_batch_selector: String,
    pub upload_button_selector: String,
    pub file_input_selector: String,
    pub confirm_upload_selector: String,
    /// Present while a file is being transferred
    pub progress_selector: String,
    /// Element naming the file once the portal has taken it
    pub completion_selector: String,
    pub wait: WaitConfig,
    pub completion_wait: WaitConfig,
}

impl GettyEspConfig {
    /// Completion selector for one file
    #[must_use]
    pub fn completion_selector_for(&self, file_name: &str) -> String {
        completion_selector(&self.completion_selector, file_name)
    }
}

impl Default for GettyEspConfig {
    fn default() -> Self {
        Self {
            landing_url: "https://esp.gettyimages.com/".to_string(),
            batches_url: "https://esp.gettyimages.com/contribute/batches?assetTypes=&page=1\
                &pageSize=10&sortColumn=created_at&sortOrder=DESC"
                .to_string(),
            create_batch_selector: r#"button[data-cy="create-batch-button"]"#.to_string(),
            confirm_batch_selector: r#"button[data-cy="create-batch-confirm-button"]"#
                .to_string(),
            upload_button_selector: r#"button[data-cy="upload-button-file-input"]"#.to_string(),
            file_input_selector: r#"input[type="file"]"#.to_string(),
            confirm_upload_selector: r#"button[data-cy="confirm-upload-button"]"#.to_string(),
            progress_selector: r#"[role="progressbar"]"#.to_string(),
            completion_selector: r#"[data-cy="asset-card"][title="{file_name}"]"#.to_string(),
            wait: WaitConfig::default(),
            completion_wait: WaitConfig {
                timeout_ms: 120_000,
                poll_interval_ms: 500,
            },
        }
    }
}

/// Batch upload through the Getty Images contributor portal
#[derive(Debug, Clone, Default)]
pub struct GettyEspMacro {
    config: GettyEspConfig,
}

impl GettyEspMacro {
    /// Create macro from settings
    #[inline]
    #[must_use]
    pub fn new(config: GettyEspConfig) -> Self {
        Self { config }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &GettyEspConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl UploadMacro for GettyEspMacro {
    fn name(&self) -> &str {
        "getty-esp"
    }

    fn landing_url(&self) -> &str {
        &self.config.landing_url
    }

    fn start_url(&self) -> &str {
        &self.config.batches_url
    }

    async fn prepare(&self, driver: &dyn PageDriver) -> Result<(), UploadError> {
        let c = &self.config;
        click_when_ready(driver, "create batch", &c.create_batch_selector, &c.wait).await?;
        click_when_ready(driver, "confirm batch", &c.confirm_batch_selector, &c.wait).await
    }

    async fn push(
        &self,
        driver: &dyn PageDriver,
        record: &ImageRecord,
    ) -> Result<(), UploadError> {
        let c = &self.config;
        let file = local_file(record).await?;
        click_when_ready(driver, "open file picker", &c.upload_button_selector, &c.wait).await?;
        send_when_ready(driver, "select file", &c.file_input_selector, &file, &c.wait).await?;
        click_when_ready(driver, "confirm upload", &c.confirm_upload_selector, &c.wait).await?;
        await_completion(
            driver,
            &c.progress_selector,
            &c.completion_selector_for(&record.file_name),
            &c.completion_wait,
        )
        .await
    }
}

/// Pexels uploader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PexelsConfig {
    pub landing_url: String,
    pub upload_url: String,
    pub sign_in_selector: String,
    pub upload_label_selector: String,
    /// Looked up without waiting once the uploader is open
    pub file_input_selector: String,
    /// Present while a file is being transferred
    pub progress_selector: String,
    /// Element naming the file once the uploader has taken it
    pub completion_selector: String,
    pub wait: WaitConfig,
    pub completion_wait: WaitConfig,
}

impl PexelsConfig {
    /// Completion selector for one file
    #[must_use]
    pub fn completion_selector_for(&self, file_name: &str) -> String {
        completion_selector(&self.completion_selector, file_name)
    }
}

impl Default for PexelsConfig {
    fn default() -> Self {
        Self {
            landing_url: "https://www.pexels.com/".to_string(),
            upload_url: "https://www.pexels.com/upload/".to_string(),
            sign_in_selector: "a.useAuth_hideWhenSignedOut__hAWWD > span > span".to_string(),
            upload_label_selector: "label".to_string(),
            file_input_selector: r#"input[type="file"]"#.to_string(),
            progress_selector: r#"[role="progressbar"]"#.to_string(),
            completion_selector: r#"img[alt="{file_name}"]"#.to_string(),
            wait: WaitConfig::default(),
            completion_wait: WaitConfig {
                timeout_ms: 120_000,
                poll_interval_ms: 500,
            },
        }
    }
}

/// Upload through the Pexels web uploader
#[derive(Debug, Clone, Default)]
pub struct PexelsMacro {
    config: PexelsConfig,
}

impl PexelsMacro {
    /// Create macro from settings
    #[inline]
    #[must_use]
    pub fn new(config: PexelsConfig) -> Self {
        Self { config }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &PexelsConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl UploadMacro for PexelsMacro {
    fn name(&self) -> &str {
        "pexels"
    }

    fn landing_url(&self) -> &str {
        &self.config.landing_url
    }

    fn start_url(&self) -> &str {
        &self.config.upload_url
    }

    async fn prepare(&self, driver: &dyn PageDriver) -> Result<(), UploadError> {
        let c = &self.config;
        click_when_ready(driver, "sign in", &c.sign_in_selector, &c.wait).await?;
        click_when_ready(driver, "open uploader", &c.upload_label_selector, &c.wait).await
    }

    async fn push(
        &self,
        driver: &dyn PageDriver,
        record: &ImageRecord,
    ) -> Result<(), UploadError> {
        let c = &self.config;
        let file = local_file(record).await?;
        let input = require(driver, "select file", &c.file_input_selector).await?;
        driver
            .send_file(&input, &file)
            .await
            .map_err(|e| UploadError::driver("select file", e))?;
        await_completion(
            driver,
            &c.progress_selector,
            &c.completion_selector_for(&record.file_name),
            &c.completion_wait,
        )
        .await
    }
}
