//! End-to-end job scenarios over the scripted browser

use futures::FutureExt;
use kodegen_tools_socialscrape::extraction::search_url;
use kodegen_tools_socialscrape::{
    CredentialArtifact, ExportFormat, JobExportError, JobResults, JobStatus, ScrapeError,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tempfile::TempDir;
use tokio::sync::Notify;
use url::Url;

mod common;
use common::{MockLauncher, MockNode, Script, group_request, marketplace_request, orchestrator};

const GROUP_A: &str = "https://www.facebook.com/groups/eastTexasLand";
const GROUP_B: &str = "https://www.facebook.com/groups/doesNotLoad";

fn base() -> Url {
    Url::parse("https://www.facebook.com").unwrap()
}

#[tokio::test]
async fn group_job_deduplicates_posts_and_filters_by_keyword() {
    let dir = TempDir::new().unwrap();
    let script = Script::new().tab("Featured").tab("Discussion").page(
        GROUP_A,
        vec![vec![
            MockNode::post_with_link(
                "5 acres of LAND for sale near the lake",
                "/groups/eastTexasLand/posts/111/",
            ),
            MockNode::post("Anyone know a good plumber?"),
            MockNode::post("5 acres of LAND for sale near the lake"),
        ]],
    );
    let (orchestrator, launcher) = orchestrator(dir.path(), script);

    let id = orchestrator
        .submit(group_request("land\n", &[GROUP_A]))
        .await
        .unwrap();
    let job = common::wait_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Completed);
    let Some(JobResults::Groups(records)) = job.results.as_deref() else {
        panic!("expected group results, got {:?}", job.results);
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].group_url, GROUP_A);
    assert_eq!(records[0].matched_keywords, ["land"]);
    assert_eq!(
        records[0].post_link,
        "https://www.facebook.com/groups/eastTexasLand/posts/111/"
    );

    // Discussion tab clicked, cookies injected, browser released
    assert_eq!(launcher.recorder.clicks.load(Ordering::SeqCst), 1);
    assert_eq!(launcher.recorder.cookies.lock().unwrap().len(), 2);
    assert_eq!(launcher.recorder.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn duplicate_post_with_phrase_keyword_collapses_to_one_record() {
    let dir = TempDir::new().unwrap();
    let listing = "Land for sale: 3 wooded acres off FM 90, owner finance";
    let script = Script::new().page(
        GROUP_A,
        vec![vec![
            MockNode::post(listing),
            MockNode::post("Anyone selling a used tractor?"),
            MockNode::post(listing),
        ]],
    );
    let (orchestrator, _) = orchestrator(dir.path(), script);

    let id = orchestrator
        .submit(group_request("land for sale", &[GROUP_A]))
        .await
        .unwrap();
    let job = common::wait_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Completed);
    let Some(JobResults::Groups(records)) = job.results.as_deref() else {
        panic!("expected group results, got {:?}", job.results);
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text_preview, listing);
    assert_eq!(records[0].matched_keywords, ["land for sale"]);
}

#[tokio::test]
async fn matched_keywords_are_substrings_of_the_preview() {
    let dir = TempDir::new().unwrap();
    let script = Script::new().page(
        GROUP_A,
        vec![
            vec![MockNode::post("Lot and land, owner finance")],
            vec![MockNode::stale(), MockNode::post("Selling a LOT of furniture")],
            vec![MockNode::post("Barn for rent")],
        ],
    );
    let (orchestrator, _) = orchestrator(dir.path(), script);

    let id = orchestrator
        .submit(group_request("land\nlot\nacre", &[GROUP_A]))
        .await
        .unwrap();
    let job = common::wait_terminal(&orchestrator, &id).await;

    let Some(JobResults::Groups(records)) = job.results.as_deref() else {
        panic!("expected group results");
    };
    assert_eq!(records.len(), 2);
    let keywords = job.keywords().as_slice();
    let mut previews = HashSet::new();
    for record in records {
        assert!(!record.matched_keywords.is_empty());
        assert!(previews.insert(record.text_preview.clone()));
        let lowered = record.text_preview.to_lowercase();
        for kw in &record.matched_keywords {
            assert!(keywords.contains(kw));
            assert!(lowered.contains(kw.as_str()));
        }
    }
    assert_eq!(records[0].matched_keywords, ["land", "lot"]);
}

#[tokio::test]
async fn group_target_stops_at_item_cap() {
    let dir = TempDir::new().unwrap();
    let posts = (0..10)
        .map(|i| MockNode::post(&format!("land listing #{i}")))
        .collect();
    let script = Script::new().page(GROUP_A, vec![posts]);
    let config = kodegen_tools_socialscrape::ScrapeConfig::builder()
        .credential_dir(dir.path())
        .settle_ms(0, 0)
        .navigation_retries(0)
        .group_max_items(4)
        .build()
        .unwrap();
    let launcher = Arc::new(MockLauncher::new(script));
    let orchestrator = kodegen_tools_socialscrape::JobOrchestrator::new(config, launcher);

    let id = orchestrator
        .submit(group_request("land", &[GROUP_A]))
        .await
        .unwrap();
    let job = common::wait_terminal(&orchestrator, &id).await;
    assert_eq!(job.results_count(), 4);
}

#[tokio::test]
async fn failing_group_target_is_skipped() {
    let dir = TempDir::new().unwrap();
    let script = Script::new()
        .failing(GROUP_B)
        .page(GROUP_A, vec![vec![MockNode::post("Land for sale")]]);
    let (orchestrator, launcher) = orchestrator(dir.path(), script);

    let id = orchestrator
        .submit(group_request("land", &[GROUP_B, GROUP_A]))
        .await
        .unwrap();
    let job = common::wait_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.error_message.is_none());
    let Some(JobResults::Groups(records)) = job.results.as_deref() else {
        panic!("expected group results");
    };
    assert_eq!(records.len(), 1);
    assert!(records.iter().all(|r| r.group_url == GROUP_A));
    assert_eq!(launcher.recorder.navigations(), [GROUP_B, GROUP_A]);
}

#[tokio::test]
async fn marketplace_job_collects_distinct_listings() {
    let dir = TempDir::new().unwrap();
    let url = search_url(&base(), "75147", "lot");
    let script = Script::new().page(
        &url,
        vec![
            vec![MockNode::listing(
                "$12,000\n1 acre lot\nMabank, TX",
                "/marketplace/item/1001/?ref=search",
            )],
            vec![
                MockNode::stale(),
                MockNode::listing("$12,000\n1 acre lot\nMabank, TX", "/marketplace/item/1001/"),
                MockNode::listing(
                    "$30,000 corner lot",
                    "https://www.facebook.com/marketplace/item/1002/",
                ),
            ],
        ],
    );
    let (orchestrator, launcher) = orchestrator(dir.path(), script);

    let id = orchestrator
        .submit(marketplace_request("Lot\n", r#"["75147"]"#))
        .await
        .unwrap();
    let job = common::wait_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Completed);
    let Some(JobResults::Marketplace(records)) = job.results.as_deref() else {
        panic!("expected marketplace results");
    };
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "$12,000 1 acre lot Mabank, TX");
    assert_eq!(records[0].url, "https://www.facebook.com/marketplace/item/1001/");
    assert!(records.iter().all(|r| r.zip_code == "75147" && r.keyword == "lot"));
    assert_eq!(launcher.recorder.navigations(), [url]);
}

#[tokio::test]
async fn marketplace_urls_are_unique_across_searches() {
    let dir = TempDir::new().unwrap();
    let shared = MockNode::listing("Shared lot", "/marketplace/item/7/");
    let script = Script::new()
        .page(
            &search_url(&base(), "75147", "lot"),
            vec![vec![shared.clone(), MockNode::listing("A", "/marketplace/item/8/")]],
        )
        .page(
            &search_url(&base(), "75147", "land"),
            vec![vec![shared.clone()]],
        )
        .page(
            &search_url(&base(), "76645", "lot"),
            vec![vec![shared, MockNode::listing("B", "/marketplace/item/9/")]],
        )
        .failing(&search_url(&base(), "76645", "land"));
    let (orchestrator, launcher) = orchestrator(dir.path(), script);

    let id = orchestrator
        .submit(marketplace_request("lot\nland", r#"["75147", 76645]"#))
        .await
        .unwrap();
    let job = common::wait_terminal(&orchestrator, &id).await;

    let Some(JobResults::Marketplace(records)) = job.results.as_deref() else {
        panic!("expected marketplace results");
    };
    let urls: HashSet<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls.len(), records.len());
    assert_eq!(records.len(), 3);
    // ZIP × keyword, in submission order
    assert_eq!(launcher.recorder.navigations().len(), 4);
}

#[tokio::test]
async fn missing_credentials_fail_the_job() {
    let dir = TempDir::new().unwrap();
    let (orchestrator, launcher) = orchestrator(dir.path(), Script::new());

    let mut request = group_request("land", &[GROUP_A]);
    request.credentials = None;
    let id = orchestrator.submit(request).await.unwrap();
    let job = common::wait_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(!job.error_message.as_deref().unwrap_or_default().is_empty());
    assert!(job.results.is_none());
    assert_eq!(launcher.recorder.launches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_credentials_fail_the_job_and_remove_the_artifact() {
    let dir = TempDir::new().unwrap();
    let (orchestrator, _) = orchestrator(dir.path(), Script::new());

    let mut request = group_request("land", &[GROUP_A]);
    request.credentials = Some(b"{not json".to_vec());
    let id = orchestrator.submit(request).await.unwrap();
    let job = common::wait_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(
        job.error_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Credential error"))
    );
    assert!(!dir.path().join(CredentialArtifact::file_name(&id)).exists());
}

#[tokio::test]
async fn rejected_cookie_injection_fails_the_job() {
    let dir = TempDir::new().unwrap();
    let (orchestrator, launcher) = orchestrator(dir.path(), Script::new().rejecting_cookies());

    let id = orchestrator
        .submit(group_request("land", &[GROUP_A]))
        .await
        .unwrap();
    let job = common::wait_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.unwrap().contains("cookie domain rejected"));
    assert!(launcher.recorder.navigations().is_empty());
    assert_eq!(launcher.recorder.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_pipeline_is_recorded_as_failure() {
    let dir = TempDir::new().unwrap();
    let (orchestrator, _) = orchestrator(dir.path(), Script::new().panicking_on(GROUP_A));

    let id = orchestrator
        .submit(group_request("land", &[GROUP_A]))
        .await
        .unwrap();
    let job = common::wait_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.unwrap().contains("renderer crashed"));
    assert!(!dir.path().join(CredentialArtifact::file_name(&id)).exists());
}

#[tokio::test]
async fn empty_keywords_are_rejected_without_a_job() {
    let dir = TempDir::new().unwrap();
    let (orchestrator, launcher) = orchestrator(dir.path(), Script::new());

    let err = orchestrator
        .submit(group_request("\n   \n", &[GROUP_A]))
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Validation(_)));
    assert!(orchestrator.registry().is_empty().await);
    assert_eq!(launcher.recorder.launches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dropped_submission_never_strands_a_pending_job() {
    let dir = TempDir::new().unwrap();
    let (orchestrator, launcher) = orchestrator(dir.path(), Script::new());

    // A disconnecting client drops the handler future after one poll
    let submitted = orchestrator
        .submit(group_request("land", &[GROUP_A]))
        .now_or_never();
    let id = submitted
        .expect("submit must not yield after registering the job")
        .unwrap();

    let jobs = orchestrator.registry().list().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, id);

    let job = common::wait_terminal(&orchestrator, &id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(launcher.recorder.launches.load(Ordering::SeqCst), 1);
    assert!(!dir.path().join(CredentialArtifact::file_name(&id)).exists());
}

#[tokio::test]
async fn status_moves_pending_running_completed() {
    let dir = TempDir::new().unwrap();
    let gate = Arc::new(Notify::new());
    let launcher = Arc::new(MockLauncher::gated(Script::new(), gate.clone()));
    let orchestrator = kodegen_tools_socialscrape::JobOrchestrator::new(
        common::test_config(dir.path()),
        launcher,
    );

    let id = orchestrator
        .submit(group_request("land", &[GROUP_A]))
        .await
        .unwrap();
    // Current-thread runtime: the task has not been polled yet
    assert_eq!(orchestrator.status(&id).await.unwrap().status, JobStatus::Pending);

    let mut status = orchestrator.registry().subscribe(&id).await.unwrap();
    status
        .wait_for(|s| *s == JobStatus::Running)
        .await
        .unwrap();
    // Credential file exists while the job runs
    assert!(dir.path().join(CredentialArtifact::file_name(&id)).exists());

    gate.notify_one();
    let job = common::wait_terminal(&orchestrator, &id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.results_count(), 0);

    let started = job.started_at.unwrap();
    let finished = job.finished_at.unwrap();
    assert!(job.created_at <= started && started <= finished);
    assert!(!dir.path().join(CredentialArtifact::file_name(&id)).exists());
}

#[tokio::test]
async fn export_requires_a_completed_job() {
    let dir = TempDir::new().unwrap();
    let gate = Arc::new(Notify::new());
    let url = search_url(&base(), "75147", "lot");
    let script = Script::new().page(
        &url,
        vec![vec![MockNode::listing("Lot", "/marketplace/item/1/")]],
    );
    let launcher = Arc::new(MockLauncher::gated(script, gate.clone()));
    let orchestrator = kodegen_tools_socialscrape::JobOrchestrator::new(
        common::test_config(dir.path()),
        launcher,
    );

    let id = orchestrator
        .submit(marketplace_request("lot", r#"["75147"]"#))
        .await
        .unwrap();
    assert!(matches!(
        orchestrator.export(&id, ExportFormat::Csv).await,
        Err(JobExportError::NotCompleted { status: JobStatus::Pending, .. })
    ));

    gate.notify_one();
    common::wait_terminal(&orchestrator, &id).await;

    let first = orchestrator.export(&id, ExportFormat::Csv).await.unwrap();
    let second = orchestrator.export(&id, ExportFormat::Csv).await.unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with(r#""ZIP Code","Keyword","Title","URL","Scraped At""#));
    assert!(first.contains("https://www.facebook.com/marketplace/item/1/"));
}
