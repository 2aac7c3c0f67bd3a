//! Deploy orchestrator tests

use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use terrctl::app::options::ServiceEndpoints;
use terrctl::deploy::orchestrator::{DeployPolicy, Deployer};
use terrctl::errors::{DeployError, WaitPhase};
use terrctl::models::instance::Instance;
use terrctl::models::upload::Language;

use crate::support::{deployed, in_progress, manual_clock, snapshot, FixedPackager, ScriptedRemote};

fn policy(max_attempts: u32) -> DeployPolicy {
    DeployPolicy {
        max_attempts,
        ..Default::default()
    }
}

fn deployer(remote: &Arc<ScriptedRemote>, max_attempts: u32) -> Deployer {
    Deployer::new(remote.clone(), manual_clock(), policy(max_attempts))
}

#[tokio::test]
async fn test_deploy_end_to_end() {
    let remote = Arc::new(
        ScriptedRemote::new()
            .with_submissions(vec![Ok(Instance::new("abc123"))])
            .with_statuses(vec![
                Ok(snapshot("compiling", true, false)),
                Ok(snapshot("deployed", true, true)),
            ])
            .with_health(vec![Ok(true)]),
    );
    let packager = FixedPackager::new(Language::Rust);

    let instance = assert_ok!(
        deployer(&remote, 10)
            .deploy(&packager, &CancellationToken::new())
            .await
    );

    assert_eq!(instance.id(), "abc123");
    let endpoints = ServiceEndpoints {
        instance_domain: "example.test".to_string(),
        ..Default::default()
    };
    assert_eq!(instance.url(&endpoints).unwrap().as_str(), "https://abc123.example.test/");
    assert_eq!(remote.submit_calls(), 1);
    assert_eq!(remote.status_calls(), 2);
    assert_eq!(remote.health_calls(), 1);
    assert_eq!(remote.submitted()[0].lang, Language::Rust);
}

#[tokio::test]
async fn test_deploy_retries_every_deployment_timeout() {
    let remote = Arc::new(ScriptedRemote::new().with_fallback_status(in_progress()));
    let packager = FixedPackager::new(Language::C);

    let err = assert_err!(
        deployer(&remote, 3)
            .deploy(&packager, &CancellationToken::new())
            .await
    );

    assert!(matches!(
        err,
        DeployError::Timeout {
            phase: WaitPhase::Deployment,
            ..
        }
    ));
    assert_eq!(remote.submit_calls(), 3);
    assert_eq!(remote.health_calls(), 0);
    assert_eq!(remote.status_calls(), 3 * 90);
}

#[tokio::test]
async fn test_deploy_repackages_on_every_attempt() {
    let remote = Arc::new(ScriptedRemote::new().with_fallback_status(in_progress()));
    let packager = FixedPackager::new(Language::Wasm);

    let _ = deployer(&remote, 4)
        .deploy(&packager, &CancellationToken::new())
        .await;

    assert_eq!(packager.calls(), 4);
    let tars: Vec<String> = remote.submitted().into_iter().map(|r| r.tar).collect();
    assert_eq!(tars, vec!["package-1", "package-2", "package-3", "package-4"]);
}

#[tokio::test]
async fn test_deploy_service_failure_aborts() {
    let remote = Arc::new(
        ScriptedRemote::new().with_statuses(vec![Ok(snapshot("undefined reference to main", false, true))]),
    );
    let packager = FixedPackager::new(Language::C);

    let err = assert_err!(
        deployer(&remote, 10)
            .deploy(&packager, &CancellationToken::new())
            .await
    );

    assert!(matches!(err, DeployError::Service(ref m) if m == "undefined reference to main"));
    assert_eq!(remote.submit_calls(), 1);
    assert_eq!(remote.health_calls(), 0);
}

#[tokio::test]
async fn test_deploy_status_transport_error_aborts() {
    let remote = Arc::new(
        ScriptedRemote::new()
            .with_statuses(vec![Err(DeployError::Transport("connection reset".to_string()))]),
    );
    let packager = FixedPackager::new(Language::C);

    let err = assert_err!(
        deployer(&remote, 10)
            .deploy(&packager, &CancellationToken::new())
            .await
    );

    assert!(matches!(err, DeployError::Transport(_)));
    assert_eq!(remote.submit_calls(), 1);
}

#[tokio::test]
async fn test_deploy_retries_failed_submissions() {
    let remote = Arc::new(ScriptedRemote::new().with_submissions(vec![
        Err(DeployError::Transport("connection refused".to_string())),
        Err(DeployError::Service("quota exceeded".to_string())),
        Ok(Instance::new("third")),
    ]));
    let packager = FixedPackager::new(Language::Rust);

    let instance = assert_ok!(
        deployer(&remote, 3)
            .deploy(&packager, &CancellationToken::new())
            .await
    );

    assert_eq!(instance.id(), "third");
    assert_eq!(remote.submit_calls(), 3);
    assert_eq!(remote.status_calls(), 1);
}

#[tokio::test]
async fn test_deploy_surfaces_last_submission_error() {
    let remote = Arc::new(ScriptedRemote::new().with_submissions(vec![
        Err(DeployError::Transport("connection refused".to_string())),
        Err(DeployError::Protocol("expected value at line 1".to_string())),
    ]));
    let packager = FixedPackager::new(Language::Rust);

    let err = assert_err!(
        deployer(&remote, 2)
            .deploy(&packager, &CancellationToken::new())
            .await
    );

    assert!(matches!(err, DeployError::Protocol(_)));
    assert_eq!(remote.status_calls(), 0);
}

#[tokio::test]
async fn test_deploy_retries_health_failures_with_fresh_submission() {
    let remote = Arc::new(
        ScriptedRemote::new()
            .with_fallback_status(deployed())
            .with_health(vec![Err(DeployError::Transport("operation timed out".to_string()))])
            .with_fallback_health(false),
    );
    let packager = FixedPackager::new(Language::AssemblyScript);

    let err = assert_err!(
        deployer(&remote, 2)
            .deploy(&packager, &CancellationToken::new())
            .await
    );

    // First attempt: transport error on the first probe. Second: 30 unhealthy probes.
    assert!(matches!(
        err,
        DeployError::Timeout {
            phase: WaitPhase::Health,
            ..
        }
    ));
    assert_eq!(remote.submit_calls(), 2);
    assert_eq!(remote.health_calls(), 1 + 30);
}

#[tokio::test]
async fn test_deploy_health_recovers_on_next_attempt() {
    let mut health: Vec<Result<bool, DeployError>> = (0..30).map(|_| Ok(false)).collect();
    health.push(Ok(true));
    let remote = Arc::new(ScriptedRemote::new().with_health(health));
    let packager = FixedPackager::new(Language::Rust);

    let instance = assert_ok!(
        deployer(&remote, 10)
            .deploy(&packager, &CancellationToken::new())
            .await
    );

    assert_eq!(instance.id(), "instance-2");
    assert_eq!(remote.submit_calls(), 2);
}

#[tokio::test]
async fn test_deploy_undetectable_language_aborts() {
    let remote = Arc::new(ScriptedRemote::new());
    let packager = FixedPackager::undetectable();

    let err = assert_err!(
        deployer(&remote, 10)
            .deploy(&packager, &CancellationToken::new())
            .await
    );

    assert!(matches!(err, DeployError::Language(_)));
    assert_eq!(packager.calls(), 1);
    assert_eq!(remote.submit_calls(), 0);
}

#[tokio::test]
async fn test_deploy_cancelled_before_submission() {
    let remote = Arc::new(ScriptedRemote::new());
    let packager = FixedPackager::new(Language::Rust);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = assert_err!(deployer(&remote, 10).deploy(&packager, &cancel).await);

    assert!(matches!(err, DeployError::Cancelled));
    assert_eq!(remote.submit_calls(), 0);
}

#[tokio::test]
async fn test_deploy_zero_attempts_is_a_config_error() {
    let remote = Arc::new(ScriptedRemote::new());
    let packager = FixedPackager::new(Language::Rust);

    let err = assert_err!(
        deployer(&remote, 0)
            .deploy(&packager, &CancellationToken::new())
            .await
    );

    assert!(matches!(err, DeployError::Config(_)));
    assert_eq!(packager.calls(), 0);
    assert_eq!(remote.submit_calls(), 0);
}

#[tokio::test]
async fn test_deploy_respects_poll_interval() {
    let remote = Arc::new(ScriptedRemote::new().with_statuses(vec![Ok(in_progress()), Ok(deployed())]));
    let clock = manual_clock();
    let policy = DeployPolicy {
        poll_interval: Duration::from_secs(3),
        ..Default::default()
    };
    let deployer = Deployer::new(remote.clone(), clock.clone(), policy);

    assert_ok!(
        deployer
            .deploy(&FixedPackager::new(Language::C), &CancellationToken::new())
            .await
    );
    assert_eq!(clock.slept(), Duration::from_secs(3));
}
