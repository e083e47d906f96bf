//! Batch upload sequencing

use crate::driver::PageDriver;
use crate::error::UploadError;
use crate::macros::UploadMacro;
use crate::session::SessionCookies;
use sp_record::ImageRecord;

/// The record whose push stopped the batch
#[derive(Debug)]
pub struct UploadFailure {
    pub file_name: String,
    pub error: UploadError,
}

/// What happened to each record handed to the uploader
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Files the platform confirmed, in upload order
    pub uploaded: Vec<String>,
    /// Files lacking a description or keywords
    pub skipped: Vec<String>,
    /// Set when a push failed; later records were not attempted
    pub aborted: Option<UploadFailure>,
}

impl UploadReport {
    /// Check whether every eligible record went up
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Drives one browser session through an upload macro
#[derive(Debug)]
pub struct UploadOrchestrator<D> {
    driver: D,
    close_when_done: bool,
}

impl<D: PageDriver> UploadOrchestrator<D> {
    /// Create orchestrator that closes the session when done
    #[inline]
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            close_when_done: true,
        }
    }

    /// Leave the browser open afterwards
    #[inline]
    #[must_use]
    pub fn keep_open(mut self) -> Self {
        self.close_when_done = false;
        self
    }

    #[inline]
    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Upload every eligible record in order
    ///
    /// Ineligible records are listed as skipped and never touch the page.
    /// The first failed push ends the batch; nothing already uploaded is
    /// rolled back.
    ///
    /// # Errors
    /// Any failure before the first push: navigation, cookies or the
    /// macro's setup.
    pub async fn upload(
        &self,
        cookies: &SessionCookies,
        upload_macro: &dyn UploadMacro,
        records: &[ImageRecord],
    ) -> Result<UploadReport, UploadError> {
        let result = self.run(cookies, upload_macro, records).await;
        if self.close_when_done {
            if let Err(err) = self.driver.close().await {
                tracing::warn!(platform = upload_macro.name(), error = %err, "closing browser failed");
            }
        }
        result
    }

    async fn run(
        &self,
        cookies: &SessionCookies,
        upload_macro: &dyn UploadMacro,
        records: &[ImageRecord],
    ) -> Result<UploadReport, UploadError> {
        let platform = upload_macro.name();
        let (eligible, ineligible): (Vec<&ImageRecord>, Vec<&ImageRecord>) =
            records.iter().partition(|r| r.is_upload_eligible());

        let mut report = UploadReport {
            skipped: ineligible.iter().map(|r| r.file_name.clone()).collect(),
            ..UploadReport::default()
        };
        for name in &report.skipped {
            tracing::warn!(platform, file = %name, "missing description or keywords, skipping");
        }

        self.driver
            .goto(upload_macro.landing_url())
            .await
            .map_err(|e| UploadError::driver("open landing page", e))?;
        for cookie in cookies.iter() {
            self.driver
                .add_cookie(cookie)
                .await
                .map_err(|e| UploadError::driver("restore session", e))?;
        }
        self.driver
            .goto(upload_macro.start_url())
            .await
            .map_err(|e| UploadError::driver("open upload page", e))?;
        upload_macro.prepare(&self.driver).await?;
        tracing::info!(platform, files = eligible.len(), "upload prepared");

        for record in eligible {
            tracing::info!(platform, file = %record.file_name, "uploading");
            match upload_macro.push(&self.driver, record).await {
                Ok(()) => report.uploaded.push(record.file_name.clone()),
                Err(error) => {
                    tracing::error!(platform, file = %record.file_name, error = %error, "upload aborted");
                    report.aborted = Some(UploadFailure {
                        file_name: record.file_name.clone(),
                        error,
                    });
                    break;
                }
            }
        }

        tracing::info!(
            platform,
            uploaded = report.uploaded.len(),
            skipped = report.skipped.len(),
            aborted = report.aborted.is_some(),
            "upload finished"
        );
        Ok(report)
    }
}
