//! Upload sequences against an in-memory page

use pretty_assertions::assert_eq;
use sp_record::ImageRecord;
use sp_test_utils::{enriched_record, image_folder, init_tracing, FakePage, PageAction};
use sp_upload::{
    require, wait_for, wait_gone, Cookie, GettyEspConfig, GettyEspMacro, PexelsConfig,
    PexelsMacro, SessionCookies, UploadError, UploadOrchestrator, WaitConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

const CREATE: &str = r#"button[data-cy="create-batch-button"]"#;
const CONFIRM_BATCH: &str = r#"button[data-cy="create-batch-confirm-button"]"#;
const UPLOAD_BUTTON: &str = r#"button[data-cy="upload-button-file-input"]"#;
const FILE_INPUT: &str = r#"input[type="file"]"#;
const CONFIRM_UPLOAD: &str = r#"button[data-cy="confirm-upload-button"]"#;
const PROGRESS: &str = r#"[role="progressbar"]"#;

/// Image files on disk, with the folder's resolved path
fn photos(names: &[&str]) -> (TempDir, PathBuf) {
    let folder = image_folder(names);
    let root = folder.path().canonicalize().unwrap();
    (folder, root)
}

/// Every control of the Getty flow, but no completion marks
fn getty_page() -> Arc<FakePage> {
    FakePage::with_elements(&[CREATE, CONFIRM_BATCH, UPLOAD_BUTTON, FILE_INPUT, CONFIRM_UPLOAD])
        .shared()
}

fn mark_uploaded(page: &FakePage, getty: &GettyEspMacro, names: &[&str]) {
    for name in names {
        page.show(&getty.config().completion_selector_for(name));
    }
}

fn cookies() -> SessionCookies {
    SessionCookies::new(vec![Cookie {
        name: "sid".to_string(),
        value: "abc".to_string(),
        domain: Some(".gettyimages.com".to_string()),
        path: Some("/".to_string()),
        expiry: None,
        http_only: true,
        secure: true,
        same_site: None,
    }])
}

fn short_waits() -> GettyEspConfig {
    GettyEspConfig {
        wait: WaitConfig::new(Duration::from_secs(2), Duration::from_millis(100)),
        completion_wait: WaitConfig::new(Duration::from_secs(5), Duration::from_millis(100)),
        ..GettyEspConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn uploads_eligible_records_and_skips_the_rest() {
    init_tracing();
    let (_folder, dir) = photos(&["a.png", "c.png"]);
    let records = vec![
        enriched_record(&dir, "a.png"),
        ImageRecord::new("bare.png", &dir),
        enriched_record(&dir, "c.png"),
    ];
    let page = getty_page();
    let getty = GettyEspMacro::new(short_waits());
    mark_uploaded(&page, &getty, &["a.png", "c.png"]);

    let report = UploadOrchestrator::new(Arc::clone(&page))
        .upload(&cookies(), &getty, &records)
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.uploaded, vec!["a.png", "c.png"]);
    assert_eq!(report.skipped, vec!["bare.png"]);
    assert_eq!(
        page.sent_files(),
        vec![dir.join("a.png"), dir.join("c.png")]
    );

    let actions = page.actions();
    assert_eq!(
        &actions[..5],
        &[
            PageAction::Goto("https://esp.gettyimages.com/".to_string()),
            PageAction::AddCookie("sid".to_string()),
            PageAction::Goto(getty.config().batches_url.clone()),
            PageAction::Click(CREATE.to_string()),
            PageAction::Click(CONFIRM_BATCH.to_string()),
        ]
    );
    assert_eq!(actions.last(), Some(&PageAction::Close));
}

#[tokio::test(start_paused = true)]
async fn page_without_completion_mark_times_out() {
    let (_folder, dir) = photos(&["a.png", "b.png"]);
    let records = vec![enriched_record(&dir, "a.png"), enriched_record(&dir, "b.png")];
    let page = getty_page();
    let getty = GettyEspMacro::new(short_waits());

    let started = Instant::now();
    let report = UploadOrchestrator::new(Arc::clone(&page))
        .upload(&cookies(), &getty, &records)
        .await
        .unwrap();

    assert!(report.uploaded.is_empty());
    let failure = report.aborted.unwrap();
    assert_eq!(failure.file_name, "a.png");
    assert!(failure.error.is_timeout());
    assert_eq!(failure.error.step(), Some("upload completion"));
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(page.sent_files(), vec![dir.join("a.png")]);
}

#[tokio::test(start_paused = true)]
async fn earlier_completion_marks_do_not_count_for_the_next_file() {
    let (_folder, dir) = photos(&["a.png", "b.png", "c.png"]);
    let records = vec![
        enriched_record(&dir, "a.png"),
        enriched_record(&dir, "b.png"),
        enriched_record(&dir, "c.png"),
    ];
    let page = getty_page();
    let getty = GettyEspMacro::new(short_waits());
    mark_uploaded(&page, &getty, &["a.png", "b.png"]);

    let started = Instant::now();
    let report = UploadOrchestrator::new(Arc::clone(&page))
        .upload(&cookies(), &getty, &records)
        .await
        .unwrap();

    assert_eq!(report.uploaded, vec!["a.png", "b.png"]);
    let failure = report.aborted.unwrap();
    assert_eq!(failure.file_name, "c.png");
    match failure.error {
        UploadError::Timeout { step, selector, .. } => {
            assert_eq!(step, "upload completion");
            assert_eq!(selector, r#"[data-cy="asset-card"][title="c.png"]"#);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(page.sent_files().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn upload_waits_for_the_progress_bar_to_clear() {
    let (_folder, dir) = photos(&["a.png", "b.png"]);
    let records = vec![enriched_record(&dir, "a.png"), enriched_record(&dir, "b.png")];
    let page = getty_page();
    let getty = GettyEspMacro::new(short_waits());
    mark_uploaded(&page, &getty, &["a.png", "b.png"]);
    page.show_for(PROGRESS, 3);

    let started = Instant::now();
    let report = UploadOrchestrator::new(Arc::clone(&page))
        .upload(&cookies(), &getty, &records)
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.uploaded, vec!["a.png", "b.png"]);
    // bar seen at 0, 100 and 200 ms, gone at 300 ms
    assert_eq!(started.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn stuck_progress_bar_aborts_the_batch() {
    let (_folder, dir) = photos(&["a.png"]);
    let records = vec![enriched_record(&dir, "a.png")];
    let page = getty_page();
    let getty = GettyEspMacro::new(short_waits());
    mark_uploaded(&page, &getty, &["a.png"]);
    page.show(PROGRESS);

    let report = UploadOrchestrator::new(Arc::clone(&page))
        .upload(&cookies(), &getty, &records)
        .await
        .unwrap();

    let failure = report.aborted.unwrap();
    assert!(failure.error.is_timeout());
    assert_eq!(failure.error.step(), Some("upload in flight"));
    assert!(report.uploaded.is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_confirmation_aborts_the_batch() {
    let (_folder, dir) = photos(&["a.png", "b.png"]);
    let records = vec![enriched_record(&dir, "a.png"), enriched_record(&dir, "b.png")];
    let page = getty_page();
    page.hide(CONFIRM_UPLOAD);
    let getty = GettyEspMacro::new(short_waits());

    let started = Instant::now();
    let report = UploadOrchestrator::new(Arc::clone(&page))
        .keep_open()
        .upload(&cookies(), &getty, &records)
        .await
        .unwrap();

    assert!(report.uploaded.is_empty());
    let failure = report.aborted.expect("batch should abort");
    assert_eq!(failure.file_name, "a.png");
    match failure.error {
        UploadError::Timeout {
            step,
            selector,
            waited,
        } => {
            assert_eq!(step, "confirm upload");
            assert_eq!(selector, CONFIRM_UPLOAD);
            assert_eq!(waited, Duration::from_secs(2));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(page.sent_files(), vec![dir.join("a.png")]);
    assert!(!page.actions().contains(&PageAction::Close));
}

#[tokio::test(start_paused = true)]
async fn relative_record_paths_are_sent_absolute() {
    // integration tests run from the package root
    let folder = tempfile::tempdir_in(".").unwrap();
    std::fs::write(folder.path().join("a.png"), b"png").unwrap();
    let relative = Path::new(".").join(folder.path().file_name().unwrap());
    let records = vec![enriched_record(&relative, "a.png")];
    let page = getty_page();
    let getty = GettyEspMacro::new(short_waits());
    mark_uploaded(&page, &getty, &["a.png"]);

    let report = UploadOrchestrator::new(Arc::clone(&page))
        .upload(&cookies(), &getty, &records)
        .await
        .unwrap();

    assert_eq!(report.uploaded, vec!["a.png"]);
    let sent = page.sent_files();
    assert!(sent[0].is_absolute());
    assert_eq!(sent, vec![folder.path().canonicalize().unwrap().join("a.png")]);
}

#[tokio::test(start_paused = true)]
async fn missing_local_file_aborts_before_touching_the_page() {
    let (_folder, dir) = photos(&["a.png"]);
    let records = vec![enriched_record(&dir, "gone.png"), enriched_record(&dir, "a.png")];
    let page = getty_page();
    let getty = GettyEspMacro::new(short_waits());
    mark_uploaded(&page, &getty, &["a.png"]);

    let report = UploadOrchestrator::new(Arc::clone(&page))
        .upload(&cookies(), &getty, &records)
        .await
        .unwrap();

    let failure = report.aborted.unwrap();
    assert_eq!(failure.file_name, "gone.png");
    assert!(matches!(
        failure.error,
        UploadError::LocalFile { ref path, .. } if *path == dir.join("gone.png")
    ));
    assert!(page.sent_files().is_empty());
    assert!(!page.actions().contains(&PageAction::Click(UPLOAD_BUTTON.to_string())));
}

#[tokio::test(start_paused = true)]
async fn setup_failure_is_an_error() {
    let page = FakePage::with_elements(&[UPLOAD_BUTTON]).shared();
    let getty = GettyEspMacro::new(short_waits());
    let records = vec![enriched_record(Path::new("/photos"), "a.png")];

    let err = UploadOrchestrator::new(Arc::clone(&page))
        .upload(&cookies(), &getty, &records)
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.step(), Some("create batch"));
    assert!(page.sent_files().is_empty());
    assert_eq!(page.actions().last(), Some(&PageAction::Close));
}

const SIGN_IN: &str = "a.useAuth_hideWhenSignedOut__hAWWD > span > span";

fn pexels() -> PexelsMacro {
    PexelsMacro::new(PexelsConfig {
        wait: WaitConfig::new(Duration::from_secs(1), Duration::from_millis(50)),
        completion_wait: WaitConfig::new(Duration::from_secs(3), Duration::from_millis(50)),
        ..PexelsConfig::default()
    })
}

#[tokio::test(start_paused = true)]
async fn pexels_signs_in_then_sends_files() {
    let page = FakePage::with_elements(&[SIGN_IN, "label", FILE_INPUT, r#"img[alt="a.png"]"#])
        .shared();
    let (_folder, dir) = photos(&["a.png"]);
    let records = vec![enriched_record(&dir, "a.png")];

    let report = UploadOrchestrator::new(Arc::clone(&page))
        .upload(&SessionCookies::default(), &pexels(), &records)
        .await
        .unwrap();

    assert_eq!(report.uploaded, vec!["a.png"]);
    assert_eq!(
        page.actions(),
        vec![
            PageAction::Goto("https://www.pexels.com/".to_string()),
            PageAction::Goto("https://www.pexels.com/upload/".to_string()),
            PageAction::Click(SIGN_IN.to_string()),
            PageAction::Click("label".to_string()),
            PageAction::SendFile {
                selector: FILE_INPUT.to_string(),
                path: dir.join("a.png"),
            },
            PageAction::Close,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn pexels_file_input_must_already_be_there() {
    let page = FakePage::with_elements(&[SIGN_IN, "label"]).shared();
    page.show_after(FILE_INPUT, 1);
    let (_folder, dir) = photos(&["a.png"]);
    let records = vec![enriched_record(&dir, "a.png")];

    let started = Instant::now();
    let report = UploadOrchestrator::new(Arc::clone(&page))
        .upload(&SessionCookies::default(), &pexels(), &records)
        .await
        .unwrap();

    let failure = report.aborted.unwrap();
    assert!(matches!(failure.error, UploadError::MissingElement { .. }));
    assert_eq!(failure.error.step(), Some("select file"));
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(page.sent_files().is_empty());
}

#[tokio::test(start_paused = true)]
async fn wait_for_polls_until_the_element_appears() {
    let page = FakePage::new();
    page.show_after("#late", 3);
    let config = WaitConfig::new(Duration::from_secs(10), Duration::from_millis(200));

    let started = Instant::now();
    let element = wait_for(&page, "late element", "#late", &config).await.unwrap();

    assert_eq!(element.id(), "#late");
    assert_eq!(page.finds(), 4);
    assert_eq!(started.elapsed(), Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn wait_for_gives_up_at_the_timeout() {
    let page = FakePage::new();
    let config = WaitConfig::new(Duration::from_millis(1000), Duration::from_millis(300));

    let err = wait_for(&page, "absent", "#never", &config).await.unwrap_err();

    match err {
        UploadError::Timeout { waited, .. } => assert_eq!(waited, Duration::from_millis(1000)),
        other => panic!("unexpected error: {other}"),
    }
    // checks at 0, 300, 600, 900 and 1000 ms
    assert_eq!(page.finds(), 5);
}

#[tokio::test(start_paused = true)]
async fn wait_gone_polls_until_the_element_leaves() {
    let page = FakePage::new();
    page.show_for("#spinner", 2);
    let config = WaitConfig::new(Duration::from_secs(10), Duration::from_millis(250));

    let started = Instant::now();
    wait_gone(&page, "spinner", "#spinner", &config).await.unwrap();

    assert_eq!(page.finds(), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(500));
    wait_gone(&page, "spinner", "#absent", &config).await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_millis(500));
}

#[tokio::test]
async fn require_does_not_wait() {
    let page = FakePage::new();
    let err = require(&page, "pick", "#missing").await.unwrap_err();
    assert!(matches!(err, UploadError::MissingElement { .. }));
    assert_eq!(page.finds(), 1);
}

#[tokio::test]
async fn cookies_load_from_an_export_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("www.pexels.com.cookies.json");
    std::fs::write(
        &path,
        r#"[{"name": "_session", "value": "v", "domain": ".pexels.com", "path": "/",
             "expires": 1893456000, "httpOnly": true, "secure": true, "sameSite": "Lax"}]"#,
    )
    .unwrap();

    let cookies = SessionCookies::load(&path).await.unwrap();

    assert_eq!(cookies.len(), 1);
    let cookie = cookies.iter().next().unwrap();
    assert_eq!(cookie.name, "_session");
    assert_eq!(cookie.expiry, Some(1_893_456_000));
}
