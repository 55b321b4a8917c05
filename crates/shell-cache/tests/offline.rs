mod common;

use common::{Harness, config, manifest, url};
use shell_cache::{
    AgentError, AgentStatus, DownloadReport, FetchMode, ManifestDiff, MessageOutcome,
};

const APP: &[(&str, &str)] = &[
    ("/", "a8ac"),
    ("index.html", "a8ac"),
    ("main.dart.js", "30a7"),
    ("assets/logo.png", "b4c9"),
];

async fn activated(core: &[&str]) -> Harness {
    let h = Harness::new(config(APP, core));
    for key in core {
        h.network.serve(key, &format!("{key} v1"));
    }
    h.agent.install().await.unwrap();
    h.agent.activate().await;
    h
}

async fn run_download(h: &Harness, message: &str) -> DownloadReport {
    match h.agent.handle_message(message).unwrap() {
        MessageOutcome::DownloadStarted(handle) => handle.await.unwrap().unwrap(),
        other => panic!("download not started: {other:?}"),
    }
}

#[tokio::test]
async fn test_download_offline_fetches_missing_assets() {
    let h = activated(&["index.html"]).await;
    h.network.serve("/", "root");
    h.network.serve("main.dart.js", "js");
    h.network.serve("assets/logo.png", "png");

    let report = run_download(&h, "download-offline").await;
    assert_eq!(
        report,
        DownloadReport {
            fetched: 3,
            failed: 0,
            skipped: 1
        }
    );
    assert_eq!(h.cached_body("/").await.as_deref(), Some("root"));
    assert_eq!(h.cached_body("main.dart.js").await.as_deref(), Some("js"));
    assert_eq!(h.cached_body("index.html").await.as_deref(), Some("index.html v1"));
    assert_eq!(h.network.calls_to(&url("index.html")), 1);
    assert!(
        h.network
            .calls()
            .iter()
            .filter(|(u, _)| u != &url("index.html"))
            .all(|(_, mode)| *mode == FetchMode::Default)
    );
}

#[tokio::test]
async fn test_download_offline_counts_failures_and_keeps_the_rest() {
    let h = activated(&[]).await;
    h.network.serve("/", "root");
    h.network.serve("index.html", "index");
    h.network.fail("main.dart.js");
    // assets/logo.png is unknown to the network and answers 404

    let report = run_download(&h, "download-offline").await;
    assert_eq!(
        report,
        DownloadReport {
            fetched: 2,
            failed: 2,
            skipped: 0
        }
    );
    assert_eq!(h.cached_body("index.html").await.as_deref(), Some("index"));
    assert_eq!(h.cached_body("main.dart.js").await, None);
    assert_eq!(h.cached_body("assets/logo.png").await, None);

    h.network.serve("main.dart.js", "js");
    let retry = run_download(&h, "downloadOffline").await;
    assert_eq!(
        retry,
        DownloadReport {
            fetched: 1,
            failed: 1,
            skipped: 2
        }
    );
    assert_eq!(h.network.calls_to(&url("index.html")), 1);
}

#[tokio::test]
async fn test_download_offline_ignores_versioned_entries() {
    let h = activated(&[]).await;
    let versioned = format!("{}?v=7", url("main.dart.js"));
    h.network
        .serve_url(&versioned, common::ok("main.dart.js", "versioned"));
    h.agent
        .handle_fetch(&shell_cache::AssetRequest::get(versioned))
        .await
        .unwrap();
    h.network.serve("main.dart.js", "plain");

    run_download(&h, "download-offline").await;
    assert_eq!(h.cached_body("main.dart.js").await.as_deref(), Some("plain"));
}

#[tokio::test]
async fn test_force_activate_skips_waiting() {
    let h = Harness::new(config(APP, &[]));

    for message in ["force-activate", "skipWaiting"] {
        assert!(matches!(
            h.agent.handle_message(message),
            Ok(MessageOutcome::SkippedWaiting)
        ));
    }
    assert_eq!(h.clients.skip_waiting_count(), 2);
    assert_eq!(h.network.call_count(), 0);
}

#[test]
fn test_download_offline_needs_a_runtime() {
    let h = Harness::new(config(APP, &[]));

    assert!(matches!(
        h.agent.handle_message("download-offline"),
        Err(AgentError::NoRuntime)
    ));
    assert!(matches!(
        h.agent.handle_message("force-activate"),
        Ok(MessageOutcome::SkippedWaiting)
    ));
    assert_eq!(h.network.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_messages_are_ignored() {
    let h = Harness::new(config(APP, &[]));

    for message in ["", "Force-Activate", " download-offline", "download-offline\n", "reload"] {
        assert!(
            matches!(h.agent.handle_message(message), Ok(MessageOutcome::Ignored)),
            "{message:?} handled"
        );
    }
    assert_eq!(h.clients.skip_waiting_count(), 0);
    assert_eq!(h.network.call_count(), 0);
}

#[tokio::test]
async fn test_status_before_and_after_activation() {
    let h = Harness::new(config(APP, &["index.html"]));
    h.network.serve("index.html", "index");

    let status = h.agent.status().await.unwrap();
    assert_eq!(
        status,
        AgentStatus {
            stores: vec![
                ("flutter-app-cache".to_string(), None),
                ("flutter-temp-cache".to_string(), None),
                ("flutter-app-manifest".to_string(), None),
            ],
            recorded: None,
        }
    );

    h.agent.install().await.unwrap();
    h.agent.activate().await;

    let status = h.agent.status().await.unwrap();
    assert_eq!(
        status.stores,
        vec![
            ("flutter-app-cache".to_string(), Some(1)),
            ("flutter-temp-cache".to_string(), None),
            ("flutter-app-manifest".to_string(), Some(1)),
        ]
    );
    let diff = status.recorded.unwrap();
    assert!(diff.is_empty());
    assert_eq!(diff.unchanged.len(), APP.len());
}

#[tokio::test]
async fn test_status_reports_pending_upgrade() {
    let h = activated(&[]).await;
    let next = config(
        &[("/", "a8ac"), ("index.html", "ffff"), ("flutter.js", "0001")],
        &[],
    );
    let upgraded = Harness::with_storage(next, h.storage.clone());

    let diff = upgraded.agent.status().await.unwrap().recorded.unwrap();
    assert_eq!(
        diff,
        ManifestDiff {
            unchanged: vec!["/".to_string()],
            changed: vec!["index.html".to_string()],
            added: vec!["flutter.js".to_string()],
            removed: vec!["assets/logo.png".to_string(), "main.dart.js".to_string()],
        }
    );
    assert_eq!(
        upgraded.agent.config().manifest,
        manifest(&[("/", "a8ac"), ("index.html", "ffff"), ("flutter.js", "0001")])
    );
}
