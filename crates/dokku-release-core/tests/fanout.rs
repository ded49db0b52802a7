//! Fan-out engine contract tests against the recording publisher.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use dokku_release_core::fakes::RecordingPublisher;
use dokku_release_core::{
    classify, expected_artifacts, targets_for, Artifact, BumpLevel, ChannelConfig, FanoutEngine,
    PackageFormat, PublishConfig, DEBIAN_CODENAMES, UBUNTU_CODENAMES,
};

fn engine(publisher: Arc<RecordingPublisher>) -> FanoutEngine {
    FanoutEngine::new(publisher, ChannelConfig::default(), PublishConfig::default())
}

fn artifact(dir: &Path, format: PackageFormat) -> Artifact {
    let artifact = expected_artifacts("appname", "1.2.3", dir)
        .into_iter()
        .find(|a| a.format == format)
        .expect("format present");
    std::fs::write(&artifact.dest_path, b"package").unwrap();
    artifact
}

fn push_counts(publisher: &RecordingPublisher) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for repo in publisher.pushed_repositories() {
        *counts.entry(repo).or_insert(0) += 1;
    }
    counts
}

#[tokio::test]
async fn official_deb_release_pushes_thirteen_official_targets() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = Arc::new(RecordingPublisher::new());
    let deb = artifact(dir.path(), PackageFormat::Deb);

    let outcome = engine(publisher.clone())
        .publish(&deb, &classify(BumpLevel::Major), false)
        .await
        .unwrap();

    assert_eq!(UBUNTU_CODENAMES.len() + DEBIAN_CODENAMES.len(), 13);
    assert_eq!(outcome.attempted(), 13);
    assert_eq!(publisher.pushes().len(), 13);
    assert!(publisher
        .pushed_repositories()
        .iter()
        .all(|r| r.starts_with("dokku/dokku/")));
    assert!(publisher.pushes().iter().all(|p| p.artifact == deb.dest_path));
    assert!(outcome.is_success());
}

#[tokio::test]
async fn prerelease_deb_pushes_thirteen_betafish_targets() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = Arc::new(RecordingPublisher::new());
    let deb = artifact(dir.path(), PackageFormat::Deb);

    let outcome = engine(publisher.clone())
        .publish(&deb, &classify(BumpLevel::Prerelease), false)
        .await
        .unwrap();

    assert_eq!(outcome.attempted(), 13);
    assert_eq!(outcome.channel_repo, "dokku/dokku-betafish");
    assert!(publisher
        .pushed_repositories()
        .iter()
        .all(|r| r.starts_with("dokku/dokku-betafish/")));
}

#[tokio::test]
async fn rpm_pushes_once_with_channel_following_classification() {
    for (level, repo) in [
        (BumpLevel::Patch, "dokku/dokku/el/7"),
        (BumpLevel::Prerelease, "dokku/dokku-betafish/el/7"),
    ] {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Arc::new(RecordingPublisher::new());
        let rpm = artifact(dir.path(), PackageFormat::Rpm);

        let outcome = engine(publisher.clone())
            .publish(&rpm, &classify(level), false)
            .await
            .unwrap();

        assert_eq!(outcome.attempted(), 1);
        assert_eq!(publisher.pushed_repositories(), vec![repo.to_string()]);
    }
}

#[tokio::test]
async fn failed_targets_do_not_stop_the_fan_out() {
    let dir = tempfile::tempdir().unwrap();
    let deb = artifact(dir.path(), PackageFormat::Deb);
    let targets = targets_for(PackageFormat::Deb, "dokku/dokku");
    let third = targets[2].repository_path();
    let ninth = targets[8].repository_path();
    let publisher = Arc::new(
        RecordingPublisher::new()
            .failing_path(&third)
            .failing_path(&ninth),
    );

    let outcome = engine(publisher.clone())
        .publish(&deb, &classify(BumpLevel::Patch), false)
        .await
        .unwrap();

    let counts = push_counts(&publisher);
    assert_eq!(counts.len(), 13);
    assert!(counts.values().all(|n| *n == 1), "each target exactly once");

    assert!(!outcome.is_success());
    assert_eq!(outcome.exit_code(), 1);
    let failed: Vec<String> = outcome
        .failures()
        .iter()
        .map(|f| f.target.repository_path())
        .collect();
    assert_eq!(failed, vec![third, ninth]);
}

#[tokio::test]
async fn sequential_failure_positions_match_catalog_order() {
    let dir = tempfile::tempdir().unwrap();
    let deb = artifact(dir.path(), PackageFormat::Deb);
    let publisher = Arc::new(
        RecordingPublisher::new()
            .failing_position(3)
            .failing_position(9),
    );
    let engine = FanoutEngine::new(
        publisher.clone(),
        ChannelConfig::default(),
        PublishConfig {
            max_concurrent: 1,
            push_timeout_secs: 0,
        },
    );

    let outcome = engine
        .publish(&deb, &classify(BumpLevel::Patch), false)
        .await
        .unwrap();

    assert_eq!(publisher.pushes().len(), 13);
    let failed_positions: Vec<usize> = outcome
        .results
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.succeeded)
        .map(|(i, _)| i + 1)
        .collect();
    assert_eq!(failed_positions, vec![3, 9]);
    assert!(outcome.results[2]
        .error_detail
        .as_deref()
        .unwrap()
        .contains("rejected"));
}

#[tokio::test]
async fn results_come_back_in_catalog_order_under_concurrency() {
    let dir = tempfile::tempdir().unwrap();
    let deb = artifact(dir.path(), PackageFormat::Deb);
    let publisher = Arc::new(RecordingPublisher::new());
    let engine = FanoutEngine::new(
        publisher,
        ChannelConfig::default(),
        PublishConfig {
            max_concurrent: 8,
            push_timeout_secs: 0,
        },
    );

    let outcome = engine
        .publish(&deb, &classify(BumpLevel::Minor), false)
        .await
        .unwrap();

    let got: Vec<_> = outcome.results.iter().map(|r| r.target.clone()).collect();
    assert_eq!(got, targets_for(PackageFormat::Deb, "dokku/dokku"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_permit_pushes_in_catalog_order_on_worker_pool() {
    let dir = tempfile::tempdir().unwrap();
    let deb = artifact(dir.path(), PackageFormat::Deb);
    let expected: Vec<String> = targets_for(PackageFormat::Deb, "dokku/dokku")
        .iter()
        .map(|t| t.repository_path())
        .collect();

    for _ in 0..50 {
        let publisher = Arc::new(RecordingPublisher::new().failing_position(3));
        let engine = FanoutEngine::new(
            publisher.clone(),
            ChannelConfig::default(),
            PublishConfig {
                max_concurrent: 1,
                push_timeout_secs: 0,
            },
        );

        let outcome = engine
            .publish(&deb, &classify(BumpLevel::Patch), false)
            .await
            .unwrap();

        assert_eq!(publisher.pushed_repositories(), expected);
        assert_eq!(
            outcome
                .failures()
                .iter()
                .map(|f| f.target.repository_path())
                .collect::<Vec<_>>(),
            vec![expected[2].clone()]
        );
    }
}
