mod common;

use std::path::Path;
use std::sync::Arc;

use common::{customer, folder_listing, test_config, FakeRunner, MockLetterStore};
use secure_letters::config::Config;
use secure_letters::pipeline::{PipelineError, SecureOutcome, SecureOutputProcessor, Stage};
use secure_letters::tools::PdfTool;

fn processor(config: &Config, store: &MockLetterStore, runner: &FakeRunner) -> SecureOutputProcessor {
    let pdftk = Arc::new(PdfTool::new(
        config.pdf.exec.clone(),
        config.pdf.extra_args.clone(),
        Arc::new(runner.clone()),
    ));
    SecureOutputProcessor::new(
        Arc::new(store.clone()),
        pdftk,
        config.pdf.clone(),
        config.email.clone(),
        config.customer_defaults(),
        config.pipeline.fail_fast,
    )
    .unwrap()
}

fn produced(folder: &Path, name: &str) {
    std::fs::write(folder.join(name), b"%PDF-1.4\n").unwrap();
}

#[tokio::test]
async fn test_secures_and_queues_email() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = MockLetterStore::new();
    store.add_customer(customer("1001", "01632 960 001")).await;
    let runner = FakeRunner::new();
    produced(dir.path(), "letter-1001-7.pdf");

    let report = processor(&config, &store, &runner).secure_all().await.unwrap();

    assert_eq!(report.secured, [dir.path().join("secure-1001-7.pdf")]);
    assert_eq!(folder_listing(dir.path()), ["pdfinfo.txt", "secure-1001-7.pdf"]);

    let calls = runner.calls().await;
    assert_eq!(calls.len(), 2);
    let (_, restrict) = &calls[0];
    assert!(restrict.iter().any(|arg| arg == "Printing"));
    let (_, finalize) = &calls[1];
    let user_pw = finalize.iter().position(|arg| arg == "user_pw").unwrap();
    assert_eq!(finalize[user_pw + 1], "01632960001");

    let emails = store.emails().await;
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].plan_no, 1001);
    assert_eq!(emails[0].to_address, "1001@customers.test");
    assert!(emails[0].body.contains("plan 1001"));

    let info = std::fs::read_to_string(dir.path().join("pdfinfo.txt")).unwrap();
    assert!(info.contains("InfoKey: Producer"));
}

#[tokio::test]
async fn test_file_without_plan_number_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = MockLetterStore::new();
    let runner = FakeRunner::new();

    let outcome = processor(&config, &store, &runner)
        .secure("letter-summary.pdf")
        .await
        .unwrap();

    assert!(matches!(outcome, SecureOutcome::Skipped(reason) if reason.contains("No plan number")));
    assert!(runner.calls().await.is_empty());
}

#[tokio::test]
async fn test_unknown_customer_is_skipped_and_file_kept() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = MockLetterStore::new();
    let runner = FakeRunner::new();
    produced(dir.path(), "letter-9999-7.pdf");

    let report = processor(&config, &store, &runner).secure_all().await.unwrap();

    assert!(report.secured.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert!(dir.path().join("letter-9999-7.pdf").exists());
    assert!(store.emails().await.is_empty());
}

#[tokio::test]
async fn test_empty_phone_means_no_user_password() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = MockLetterStore::new();
    store.add_customer(customer("1001", "")).await;
    let runner = FakeRunner::new();
    produced(dir.path(), "letter-1001-7.pdf");

    processor(&config, &store, &runner).secure_all().await.unwrap();

    let calls = runner.calls().await;
    let (_, finalize) = calls.last().unwrap();
    assert!(finalize.iter().any(|arg| arg == "owner_pw"));
    assert!(!finalize.iter().any(|arg| arg == "user_pw"));
}

#[tokio::test]
async fn test_missing_email_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = MockLetterStore::new();
    let mut record = customer("1001", "01632 960 001");
    record.email = String::new();
    store.add_customer(record).await;
    produced(dir.path(), "letter-1001-7.pdf");

    processor(&config, &store, &FakeRunner::new())
        .secure_all()
        .await
        .unwrap();

    assert_eq!(store.emails().await[0].to_address, "nobody@test");
}

#[tokio::test]
async fn test_tool_failure_keeps_produced_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = MockLetterStore::new();
    store.add_customer(customer("1001", "01632 960 001")).await;
    store.add_customer(customer("1002", "01632 960 002")).await;
    let runner = FakeRunner::new();
    runner.fail_on("stage-1001").await;
    produced(dir.path(), "letter-1001-7.pdf");
    produced(dir.path(), "letter-1002-7.pdf");

    let report = processor(&config, &store, &runner).secure_all().await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, Stage::Restrict);
    assert_eq!(report.secured.len(), 1);
    assert_eq!(
        folder_listing(dir.path()),
        ["letter-1001-7.pdf", "pdfinfo.txt", "secure-1002-7.pdf"]
    );
    assert_eq!(store.emails().await.len(), 1);
}

#[tokio::test]
async fn test_fail_fast_aborts_secure_pass() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.pipeline.fail_fast = true;
    let store = MockLetterStore::new();
    store.add_customer(customer("1001", "01632 960 001")).await;
    store.add_customer(customer("1002", "01632 960 002")).await;
    let runner = FakeRunner::new();
    runner.fail_on("update_info").await;
    produced(dir.path(), "letter-1001-7.pdf");
    produced(dir.path(), "letter-1002-7.pdf");

    let err = processor(&config, &store, &runner).secure_all().await.unwrap_err();

    match err {
        PipelineError::FailFast(failure) => assert_eq!(failure.stage, Stage::Finalize),
        other => panic!("unexpected error: {other}"),
    }
    assert!(dir.path().join("letter-1002-7.pdf").exists());
    assert!(!dir.path().join("stage-1001-7.pdf").exists());
}
