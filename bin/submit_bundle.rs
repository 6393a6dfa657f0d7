use alloy::{primitives::U256, sol, sol_types::SolCall};
use bundler::{
    bundle::{BundleBuilder, SignedBundle},
    chain::ChainClient,
    config::{HostProvider, SubmitterConfig},
    relay::FlashbotsRelay,
    tasks::{
        resolve::ResolutionTracker,
        submit::{Inclusion, SubmissionError, SubmitTask},
    },
};
use init4_bin_base::{
    deps::tracing::{Instrument, error, info, info_span},
    utils::from_env::FromEnv,
};

sol! {
    interface IPresale {
        function enablePresale() external;
        function presale(uint256 amount) external payable;
    }
}

/// Everything needed to start submitting.
struct Prepared {
    task: SubmitTask<FlashbotsRelay, ResolutionTracker<HostProvider>>,
    bundle: SignedBundle,
    start_block: u64,
}

#[tokio::main]
async fn main() {
    let guard = init4_bin_base::init4();

    let code = match run().await {
        Ok(inclusion) => {
            info!(
                block = inclusion.block(),
                bundle_hash = %inclusion.attempt.bundle_hash,
                submissions = inclusion.submissions,
                "bundle landed"
            );
            0
        }
        Err(err) => {
            let code = SubmissionError::exit_code_of(&err);
            error!(%err, code, "bundle submission failed");
            code
        }
    };

    // flush telemetry before exiting
    drop(guard);
    std::process::exit(code);
}

async fn run() -> eyre::Result<Inclusion> {
    let config = SubmitterConfig::from_env()?;
    let Prepared { task, bundle, start_block } =
        prepare(&config).instrument(info_span!("submitter initialization")).await?;

    Ok(task.run_submission(&bundle, start_block, config.max_attempts()).await?)
}

async fn prepare(config: &SubmitterConfig) -> eyre::Result<Prepared> {
    let (provider, tx_signer, relay) = tokio::try_join!(
        config.connect_provider(),
        config.connect_tx_signer(),
        config.connect_relay(),
    )?;
    info!(
        rpc = %provider.url,
        relay = %relay.relay_url,
        relay_signer = %relay.signer_address(),
        "connected"
    );

    let mut builder = BundleBuilder::new();
    if let Some(raw) = config.backrun_tx()? {
        builder = builder.push_raw(raw)?;
    }

    let enable = config.presale_spec(IPresale::enablePresaleCall {}.abi_encode());
    builder = builder.push(enable, tx_signer.clone());
    if let Some(amount) = config.presale_amount {
        let presale = config
            .presale_spec(IPresale::presaleCall { amount: U256::from(amount) }.abi_encode())
            .with_value(config.presale_value());
        builder = builder.push(presale, tx_signer);
    }

    let bundle = builder.build()?.sign(&provider.connection).await?;

    // the head block is already sealed, so the first candidate is the next one
    let start_block = provider.connection.block_number().await? + 1;
    info!(start_block, txs = bundle.len(), "bundle signed");

    let tracker = config.resolution_tracker(provider.connection);
    let task = SubmitTask::new(relay, tracker, config.submit_settings());

    Ok(Prepared { task, bundle, start_block })
}
