//! Check → download → install scenarios against a fake host.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::harness::{
    drain, is_within, manifest_json, progress_of, Layout, TestEnv, FULL_PACKAGE, MINIMAL_PACKAGE,
};
use app_updater::{
    CommandOutput, DownloadOutcome, Error, InstallOutcome, Os, SessionState, UpdaterEvent,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scenario A: same baseline selects the minimal package.
#[tokio::test]
async fn test_same_baseline_plans_minimal_update() {
    let env = TestEnv::packaged("1.0.0");
    let location = env.write_manifest(&manifest_json(Os::Mac, "2.0.0", "b1", "28.0", 120, 800));
    let mut updater = env.updater(location, Os::Mac);
    let mut rx = updater.subscribe();

    let update = updater.check_for_updates().await.expect("update expected");
    assert!(!update.full_update);
    assert_eq!(update.filename, MINIMAL_PACKAGE);
    assert_eq!(update.size, 120);
    assert_eq!(update.current_version, "1.0.0");
    assert_eq!(update.remote_version, "2.0.0");
    assert_eq!(
        update.url,
        env.release_dir().join(MINIMAL_PACKAGE).display().to_string()
    );
    assert_eq!(
        update.release_notes.as_deref().map(<[String]>::len),
        Some(2)
    );
    assert!(update.release_date.is_some());

    let events = drain(&mut rx);
    assert!(matches!(events[0], UpdaterEvent::CheckingForUpdate));
    assert!(matches!(&events[1], UpdaterEvent::UpdateAvailable(u) if *u == update));
    assert_eq!(events.len(), 2);
    assert_eq!(updater.current_update(), Some(&update));
}

/// Scenario B: a different build id forces the full package.
#[tokio::test]
async fn test_build_mismatch_plans_full_update() {
    let env = TestEnv::packaged("1.0.0");
    let location = env.write_manifest(&manifest_json(Os::Mac, "2.0.0", "b2", "28.0", 120, 800));
    let mut updater = env.updater(location, Os::Mac);

    let update = updater.check_for_updates().await.expect("update expected");
    assert!(update.full_update);
    assert_eq!(update.filename, FULL_PACKAGE);
    assert_eq!(update.size, 800);
}

/// Scenario C: same version means no update.
#[tokio::test]
async fn test_current_version_is_latest() {
    let env = TestEnv::packaged("2.0.0");
    let location = env.write_manifest(&manifest_json(Os::Mac, "2.0.0", "b1", "28.0", 120, 800));
    let mut updater = env.updater(location, Os::Mac);
    let mut rx = updater.subscribe();

    assert!(updater.check_for_updates().await.is_none());

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    match &events[1] {
        UpdaterEvent::UpdateNotAvailable(info) => {
            assert_eq!(info.current_version, "2.0.0");
            assert_eq!(info.remote_version, "2.0.0");
            assert_eq!(info.system, Os::Mac);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(updater.session().state(), &SessionState::Idle);
}

/// Scenario D: no manifest anywhere is "no update", not an error.
#[tokio::test]
async fn test_unreachable_manifest_is_no_update() {
    let env = TestEnv::packaged("1.0.0");

    let missing = env.dir.path().join("nowhere").join("latest.json");
    let mut updater = env.updater(missing.display().to_string(), Os::Mac);
    assert!(updater.check_for_updates().await.is_none());

    // Nothing listens on the discard port.
    let mut updater = env.updater("http://127.0.0.1:9/latest.json", Os::Mac);
    assert!(updater.check_for_updates().await.is_none());
    assert_eq!(
        updater.download_update().await.unwrap(),
        DownloadOutcome::NotReady
    );
}

#[tokio::test]
async fn test_malformed_manifest_is_no_update() {
    let env = TestEnv::packaged("1.0.0");
    let location = env.write_manifest("{\"mac\": {\"version\": 2}}");
    let mut updater = env.updater(location, Os::Mac);

    assert!(updater.check_for_updates().await.is_none());
}

#[tokio::test]
async fn test_unpublished_os_is_no_update() {
    let env = TestEnv::packaged("1.0.0");
    let location = env.write_manifest(&manifest_json(Os::Mac, "2.0.0", "b1", "28.0", 120, 800));
    let mut updater = env.updater(location, Os::Win);
    let mut rx = updater.subscribe();

    assert!(updater.check_for_updates().await.is_none());
    assert_eq!(drain(&mut rx).len(), 1);
}

#[tokio::test]
async fn test_failed_recheck_discards_previous_plan() {
    let env = TestEnv::packaged("1.0.0");
    let location = env.write_manifest(&manifest_json(Os::Mac, "2.0.0", "b1", "28.0", 120, 800));
    let mut updater = env.updater(location.clone(), Os::Mac);
    assert!(updater.check_for_updates().await.is_some());

    std::fs::write(&location, manifest_json(Os::Mac, "1.0.0", "b1", "28.0", 120, 800)).unwrap();
    assert!(updater.check_for_updates().await.is_none());
    assert!(updater.current_update().is_none());
    assert_eq!(
        updater.download_update().await.unwrap(),
        DownloadOutcome::NotReady
    );
}

#[tokio::test]
async fn test_local_package_download_and_mac_install() {
    let env = TestEnv::packaged("1.0.0");
    let package = b"PK\x03\x04 minimal package bytes";
    env.write_package(MINIMAL_PACKAGE, package);
    let location = env.write_manifest(&manifest_json(
        Os::Mac,
        "2.0.0",
        "b1",
        "28.0",
        package.len() as u64,
        800,
    ));
    let mut updater = env.updater(location, Os::Mac);
    let mut rx = updater.subscribe();

    updater.check_for_updates().await.unwrap();
    drain(&mut rx);

    let mut seen = Vec::new();
    let outcome = updater
        .download_update_with_progress(|loaded, total| seen.push((loaded, total)))
        .await
        .unwrap();
    let DownloadOutcome::Downloaded(local) = outcome else {
        panic!("expected download");
    };

    let size = package.len() as u64;
    assert_eq!(seen, vec![(0, size), (size, size)]);
    assert!(is_within(&local, &env.download_dir()));
    assert_eq!(std::fs::read(&local).unwrap(), package);
    assert_eq!(updater.session().downloaded_path(), Some(local.as_path()));

    let events = drain(&mut rx);
    assert_eq!(progress_of(&events), vec![(0, size), (size, size)]);
    assert!(matches!(
        events.last(),
        Some(UpdaterEvent::UpdateDownloaded { path }) if *path == local
    ));

    let outcome = updater.quit_and_install().await.unwrap();
    assert_eq!(outcome, InstallOutcome::Installed { relaunched: true });

    let runs = env.runner.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].program, "unzip");
    assert_eq!(
        runs[0].args,
        vec![
            "-o".to_string(),
            local.display().to_string(),
            "-d".to_string(),
            env.contents_dir().display().to_string(),
        ]
    );
    assert_eq!(env.host.relaunches(), 1);
    assert_eq!(env.host.quits(), 1);
}

#[tokio::test]
async fn test_development_install_skips_relaunch() {
    let env = TestEnv::new(Layout::Development, "1.0.0", "b1", "28.0");
    env.write_package(MINIMAL_PACKAGE, b"zip");
    let location = env.write_manifest(&manifest_json(Os::Mac, "2.0.0", "b1", "28.0", 3, 800));
    let mut updater = env.updater(location, Os::Mac);

    updater.check_for_updates().await.unwrap();
    assert!(updater.session().is_development());
    updater.download_update().await.unwrap();

    let outcome = updater.quit_and_install().await.unwrap();
    assert_eq!(outcome, InstallOutcome::Installed { relaunched: false });
    assert_eq!(env.runner.runs().len(), 1);
    assert_eq!(env.host.relaunches(), 0);
    assert_eq!(env.host.quits(), 0);
}

#[tokio::test]
async fn test_install_before_download_does_not_quit() {
    let env = TestEnv::packaged("1.0.0");
    let location = env.write_manifest(&manifest_json(Os::Mac, "2.0.0", "b1", "28.0", 3, 800));
    let mut updater = env.updater(location, Os::Mac);

    assert_eq!(
        updater.quit_and_install().await.unwrap(),
        InstallOutcome::NotReady
    );
    updater.check_for_updates().await.unwrap();
    assert_eq!(
        updater.quit_and_install().await.unwrap(),
        InstallOutcome::NotReady
    );

    assert!(env.runner.runs().is_empty());
    assert_eq!(env.host.relaunches(), 0);
    assert_eq!(env.host.quits(), 0);
}

#[tokio::test]
async fn test_mac_stderr_output_fails_install() {
    let env = TestEnv::packaged("1.0.0");
    env.write_package(MINIMAL_PACKAGE, b"zip");
    let location = env.write_manifest(&manifest_json(Os::Mac, "2.0.0", "b1", "28.0", 3, 800));
    let mut updater = env.updater(location, Os::Mac);
    let mut rx = updater.subscribe();

    updater.check_for_updates().await.unwrap();
    updater.download_update().await.unwrap();
    drain(&mut rx);

    env.runner.set_output(CommandOutput {
        success: true,
        code: Some(0),
        stdout: String::new(),
        stderr: "error: cannot create Contents/Info.plist\n".to_string(),
    });

    let err = updater.quit_and_install().await.unwrap_err();
    assert!(matches!(err, Error::Install(ref msg) if msg.contains("Info.plist")));

    let events = drain(&mut rx);
    assert!(matches!(events.last(), Some(UpdaterEvent::Error { .. })));
    assert_eq!(env.host.relaunches(), 0);
    assert_eq!(env.host.quits(), 0);

    // The session still holds the download, so the user can retry.
    assert!(updater.session().downloaded_path().is_some());
}

#[tokio::test]
async fn test_mac_failed_exit_and_missing_unzip_fail_install() {
    let env = TestEnv::packaged("1.0.0");
    env.write_package(MINIMAL_PACKAGE, b"zip");
    let location = env.write_manifest(&manifest_json(Os::Mac, "2.0.0", "b1", "28.0", 3, 800));
    let mut updater = env.updater(location, Os::Mac);
    updater.check_for_updates().await.unwrap();
    updater.download_update().await.unwrap();

    env.runner.set_output(CommandOutput {
        success: false,
        code: Some(9),
        stdout: String::new(),
        stderr: String::new(),
    });
    assert!(matches!(
        updater.quit_and_install().await.unwrap_err(),
        Error::Install(_)
    ));

    env.runner.fail_run();
    assert!(matches!(
        updater.quit_and_install().await.unwrap_err(),
        Error::Install(_)
    ));
    assert_eq!(env.host.quits(), 0);
}

#[tokio::test]
async fn test_windows_install_launches_installer_and_quits() {
    let env = TestEnv::packaged("1.0.0");
    env.write_package(FULL_PACKAGE, b"MZ installer");
    let location = env.write_manifest(&manifest_json(Os::Win, "1.1.0", "b9", "30.0", 3, 12));
    let mut updater = env.updater(location, Os::Win);

    let update = updater.check_for_updates().await.unwrap();
    assert!(update.full_update);
    let DownloadOutcome::Downloaded(local) = updater.download_update().await.unwrap() else {
        panic!("expected download");
    };

    let outcome = updater.quit_and_install().await.unwrap();
    assert_eq!(outcome, InstallOutcome::InstallerLaunched);

    let spawns = env.runner.spawns();
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0].program, local.display().to_string());
    assert_eq!(spawns[0].args, vec!["/VERYSILENT", "/update=true"]);
    assert!(env.runner.runs().is_empty());
    assert_eq!(env.host.quits(), 1);
    assert_eq!(env.host.relaunches(), 0);
}

#[tokio::test]
async fn test_windows_spawn_failure_keeps_app_running() {
    let env = TestEnv::packaged("1.0.0");
    env.write_package(FULL_PACKAGE, b"MZ installer");
    let location = env.write_manifest(&manifest_json(Os::Win, "1.1.0", "b9", "30.0", 3, 12));
    let mut updater = env.updater(location, Os::Win);
    updater.check_for_updates().await.unwrap();
    updater.download_update().await.unwrap();

    env.runner.fail_spawn();
    assert!(matches!(
        updater.quit_and_install().await.unwrap_err(),
        Error::Install(_)
    ));
    assert_eq!(env.host.quits(), 0);
}

#[tokio::test]
async fn test_http_manifest_and_streamed_download() {
    let server = MockServer::start().await;
    let body: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

    Mock::given(method("GET"))
        .and(path("/releases/latest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(manifest_json(
            Os::Mac,
            "2.0.0",
            "b1",
            "28.0",
            body.len() as u64,
            900_000,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/releases/{MINIMAL_PACKAGE}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::packaged("1.0.0");
    let mut updater = env.updater(format!("{}/releases/latest.json", server.uri()), Os::Mac);
    let mut rx = updater.subscribe();

    let update = updater.check_for_updates().await.unwrap();
    assert_eq!(
        update.url,
        format!("{}/releases/{MINIMAL_PACKAGE}", server.uri())
    );

    let mut seen = Vec::new();
    let DownloadOutcome::Downloaded(local) = updater
        .download_update_with_progress(|l, t| seen.push((l, t)))
        .await
        .unwrap()
    else {
        panic!("expected download");
    };

    assert_eq!(std::fs::read(&local).unwrap(), body);
    let total = body.len() as u64;
    assert_eq!(seen.first(), Some(&(0, total)));
    assert_eq!(seen.last(), Some(&(total, total)));
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
    assert!(seen.iter().all(|&(_, t)| t == total));

    let progress = progress_of(&drain(&mut rx));
    assert_eq!(progress, seen);
}

#[tokio::test]
async fn test_download_failure_is_reported_and_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/releases/latest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(manifest_json(
            Os::Mac, "2.0.0", "b2", "28.0", 10, 20,
        )))
        .mount(&server)
        .await;

    let env = TestEnv::packaged("1.0.0");
    let mut updater = env.updater(format!("{}/releases/latest.json", server.uri()), Os::Mac);
    let mut rx = updater.subscribe();
    updater.check_for_updates().await.unwrap();
    drain(&mut rx);

    let err = updater.download_update().await.unwrap_err();
    assert!(err.to_string().contains(FULL_PACKAGE), "got {err}");

    let events = drain(&mut rx);
    assert_eq!(progress_of(&events), vec![(0, 20)]);
    assert!(matches!(events.last(), Some(UpdaterEvent::Error { .. })));
    assert!(matches!(updater.session().state(), SessionState::Available(_)));
    assert!(!env.download_dir().join(FULL_PACKAGE).exists());

    Mock::given(method("GET"))
        .and(path(format!("/releases/{FULL_PACKAGE}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 20]))
        .mount(&server)
        .await;

    let outcome = updater.download_update().await.unwrap();
    assert!(matches!(outcome, DownloadOutcome::Downloaded(_)));
    assert!(matches!(updater.session().state(), SessionState::Downloaded(_)));
}
