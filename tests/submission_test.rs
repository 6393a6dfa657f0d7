//! Submission loop scenarios, run against in-memory relay and chain fakes.
use bundler::{
    bundle::SignedBundle,
    provider::resolve_provider,
    tasks::{
        resolve::{Resolution, ResolutionTracker, ResolveInclusion},
        submit::{Inclusion, SubmissionError, SubmitSettings, SubmitTask},
    },
    test_utils::{
        FakeChain, FakeProbe, FakeRelay, ScriptedResolver, SimBehavior, setup_logging,
        signed_test_bundle,
    },
};
use std::time::Duration;
use url::Url;

fn submit_task<W: ResolveInclusion>(relay: FakeRelay, resolver: W) -> SubmitTask<FakeRelay, W> {
    SubmitTask::new(relay, resolver, SubmitSettings::default())
}

async fn run(
    task: &SubmitTask<FakeRelay, ScriptedResolver>,
    bundle: &SignedBundle,
    start_block: u64,
    max_attempts: u64,
) -> Result<Inclusion, SubmissionError> {
    task.run_submission(bundle, start_block, max_attempts).await
}

#[tokio::test]
async fn exhausts_window_without_inclusion() {
    setup_logging();
    let bundle = signed_test_bundle(2).await;
    let task = submit_task(FakeRelay::default(), ScriptedResolver::default());

    let err = run(&task, &bundle, 100, 3).await.unwrap_err();

    assert!(matches!(err, SubmissionError::ExhaustedRetries { start_block: 100, attempts: 3 }));
    assert!(!err.is_fatal());
    assert_eq!(task.relay().sent(), vec![100, 101, 102]);
}

#[tokio::test]
async fn included_on_third_attempt() {
    setup_logging();
    let bundle = signed_test_bundle(2).await;
    let resolver = ScriptedResolver::default().resolve_at(102, Resolution::Included);
    let task = submit_task(FakeRelay::default(), resolver);

    let inclusion = run(&task, &bundle, 100, 5).await.unwrap();

    assert_eq!(inclusion.block(), 102);
    assert_eq!(inclusion.submissions, 3);
    assert_eq!(inclusion.attempt.resolution, Resolution::Included);
    assert_eq!(inclusion.attempt.bundle_hash, FakeRelay::bundle_hash(&bundle));
    assert!(inclusion.attempt.stats.is_some_and(|stats| stats.is_simulated));
    assert_eq!(task.relay().sent(), vec![100, 101, 102]);
}

#[tokio::test]
async fn nonce_too_high_halts() {
    setup_logging();
    let bundle = signed_test_bundle(1).await;
    let resolver = ScriptedResolver::default().resolve_at(101, Resolution::NonceTooHigh);
    let task = submit_task(FakeRelay::default(), resolver);

    let err = run(&task, &bundle, 100, 5).await.unwrap_err();

    assert!(matches!(err, SubmissionError::NonceTooHigh { block: 101 }));
    assert!(err.is_fatal());
    assert_eq!(task.relay().sent(), vec![100, 101]);
    assert_eq!(task.resolver().resolved(), vec![100, 101]);
}

#[tokio::test]
async fn no_reachable_endpoint_submits_nothing() {
    setup_logging();
    let endpoints: Vec<Url> = ["http://a.invalid", "http://b.invalid", "http://c.invalid"]
        .into_iter()
        .map(|url| Url::parse(url).unwrap())
        .collect();
    let probe = FakeProbe::unreachable();
    let task = submit_task(FakeRelay::default(), ScriptedResolver::default());
    let bundle = signed_test_bundle(1).await;

    let res: Result<Inclusion, SubmissionError> = async {
        resolve_provider(&probe, &endpoints).await?;
        task.run_submission(&bundle, 100, 3).await
    }
    .await;

    let err = res.unwrap_err();
    assert!(matches!(err, SubmissionError::ProviderUnavailable(_)));
    assert!(err.is_fatal());
    assert_eq!(probe.probed(), endpoints);
    assert!(task.relay().simulated().is_empty());
    assert!(task.relay().sent().is_empty());
}

#[tokio::test]
async fn targets_strictly_increase_from_start() {
    let bundle = signed_test_bundle(1).await;
    for max_attempts in [1, 4, 7] {
        let task = submit_task(FakeRelay::default(), ScriptedResolver::default());
        let _ = run(&task, &bundle, 500, max_attempts).await;

        let sent = task.relay().sent();
        let expected: Vec<u64> = (500..500 + max_attempts).collect();
        assert_eq!(sent, expected);
        assert_eq!(task.resolver().resolved(), expected);
    }
}

#[tokio::test]
async fn inclusion_at_k_means_k_plus_one_submissions() {
    let bundle = signed_test_bundle(1).await;
    for k in 0..4 {
        let resolver = ScriptedResolver::default().resolve_at(10 + k, Resolution::Included);
        let task = submit_task(FakeRelay::default(), resolver);

        let inclusion = run(&task, &bundle, 10, 5).await.unwrap();

        assert_eq!(inclusion.submissions, k + 1);
        assert_eq!(task.relay().sent().len() as u64, k + 1);
    }
}

#[tokio::test]
async fn advisory_simulation_failures_never_block() {
    let bundle = signed_test_bundle(2).await;
    for behavior in [SimBehavior::Revert("nope".into()), SimBehavior::RelayError, SimBehavior::Transport]
    {
        let relay = FakeRelay::default().with_simulation(behavior);
        let task = submit_task(relay, ScriptedResolver::default());

        let err = run(&task, &bundle, 100, 2).await.unwrap_err();

        assert!(matches!(err, SubmissionError::ExhaustedRetries { .. }));
        assert_eq!(task.relay().simulated(), vec![100]);
        assert_eq!(task.relay().sent(), vec![100, 101]);
    }
}

#[tokio::test]
async fn chain_failure_during_resolution_aborts() {
    let bundle = signed_test_bundle(1).await;
    let task = submit_task(FakeRelay::default(), ScriptedResolver::default().failing_at(100));

    let err = run(&task, &bundle, 100, 3).await.unwrap_err();

    assert!(matches!(err, SubmissionError::Rpc(_)));
    assert_eq!(task.relay().sent(), vec![100]);
}

#[tokio::test]
async fn tracker_resolves_against_chain() {
    setup_logging();
    let bundle = signed_test_bundle(2).await;
    let chain = FakeChain::new(100)
        .advancing()
        .with_block(100, vec![])
        .with_block(101, vec![Default::default()])
        .with_block(102, bundle.tx_hashes().collect());
    let tracker = ResolutionTracker::new(chain, Duration::ZERO);
    let task = submit_task(FakeRelay::default(), tracker);

    let inclusion = task.run_submission(&bundle, 100, 5).await.unwrap();

    assert_eq!(inclusion.block(), 102);
    assert_eq!(inclusion.submissions, 3);
    assert_eq!(task.relay().sent(), vec![100, 101, 102]);
}

#[tokio::test]
async fn tracker_detects_consumed_nonce() {
    let bundle = signed_test_bundle(1).await;
    let tx = &bundle.txs()[0];
    let chain = FakeChain::new(100)
        .with_block(100, vec![])
        .with_nonce(tx.from, tx.nonce + 1);
    let tracker = ResolutionTracker::new(chain, Duration::ZERO);
    let task = submit_task(FakeRelay::default(), tracker);

    let err = task.run_submission(&bundle, 100, 5).await.unwrap_err();

    assert!(matches!(err, SubmissionError::NonceTooHigh { block: 100 }));
    assert_eq!(task.relay().sent(), vec![100]);
    assert!(task.relay().stats_requested().is_empty());
}
