//! Provider failover, signing and resolution against a local Anvil node.
use alloy::{
    node_bindings::Anvil,
    primitives::{Address, Bytes, U256},
    providers::Provider,
    signers::local::PrivateKeySigner,
};
use bundler::{
    bundle::{BundleBuilder, SignedBundle, TransactionSpec},
    chain::ChainClient,
    config::HostProvider,
    constants::SEPOLIA_CHAIN_ID,
    provider::{HttpProbe, ProviderUnavailable, resolve_provider},
    tasks::resolve::{Resolution, ResolutionTracker, ResolveInclusion},
    test_utils::setup_logging,
    utils::gwei_to_wei,
};
use std::time::Duration;
use url::Url;

fn transfer(value: u64) -> TransactionSpec {
    TransactionSpec::new(Address::repeat_byte(0x22), Bytes::new(), SEPOLIA_CHAIN_ID)
        .with_value(U256::from(value))
        .with_gas_limit(21_000)
        .with_fees(gwei_to_wei(100), gwei_to_wei(1))
}

async fn sign(
    signer: &PrivateKeySigner,
    value: u64,
    provider: &HostProvider,
) -> eyre::Result<SignedBundle> {
    BundleBuilder::new().push(transfer(value), signer.clone()).build()?.sign(provider).await
}

#[ignore = "integration test"]
#[tokio::test]
async fn test_failover_and_inclusion() -> eyre::Result<()> {
    setup_logging();
    let anvil = Anvil::new().chain_id(SEPOLIA_CHAIN_ID).try_spawn()?;
    let dead = Url::parse("http://127.0.0.1:1")?;

    let resolved =
        resolve_provider(&HttpProbe::for_chain(SEPOLIA_CHAIN_ID), &[dead, anvil.endpoint_url()])
            .await?;
    assert_eq!(resolved.index, 1);
    let provider = resolved.connection;

    let signer = PrivateKeySigner::from(anvil.keys()[0].clone());
    let bundle = sign(&signer, 1, &provider).await?;
    assert_eq!(bundle.txs()[0].nonce, 0);

    let target = provider.block_number().await? + 1;
    provider.send_raw_transaction(&bundle.txs()[0].raw).await?.get_receipt().await?;

    let tracker = ResolutionTracker::new(provider, Duration::from_millis(100));
    assert_eq!(tracker.await_resolution(&bundle, target).await?, Resolution::Included);
    Ok(())
}

#[ignore = "integration test"]
#[tokio::test]
async fn test_consumed_nonce() -> eyre::Result<()> {
    setup_logging();
    let anvil = Anvil::new().chain_id(SEPOLIA_CHAIN_ID).try_spawn()?;
    let provider = HostProvider::new_http(anvil.endpoint_url());
    let signer = PrivateKeySigner::from(anvil.keys()[1].clone());

    let bundle = sign(&signer, 1, &provider).await?;
    let competing = sign(&signer, 2, &provider).await?;
    assert_eq!(bundle.txs()[0].nonce, competing.txs()[0].nonce);

    provider.send_raw_transaction(&competing.txs()[0].raw).await?.get_receipt().await?;

    let far_target = provider.block_number().await? + 100;
    let tracker = ResolutionTracker::new(provider, Duration::from_millis(100));
    assert_eq!(tracker.await_resolution(&bundle, far_target).await?, Resolution::NonceTooHigh);
    Ok(())
}

#[ignore = "integration test"]
#[tokio::test]
async fn test_wrong_chain_is_unavailable() -> eyre::Result<()> {
    let anvil = Anvil::new().chain_id(1).try_spawn()?;

    let err = resolve_provider(&HttpProbe::for_chain(SEPOLIA_CHAIN_ID), &[anvil.endpoint_url()])
        .await
        .unwrap_err();
    assert_eq!(err, ProviderUnavailable { attempted: 1 });
    Ok(())
}
