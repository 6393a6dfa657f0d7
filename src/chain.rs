//! The slice of host chain access needed to sign and resolve bundles.
use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    network::Ethereum,
    primitives::{Address, TxHash},
    providers::Provider,
};
use std::future::Future;

/// Read access to the host chain.
///
/// Implemented for every alloy [`Provider`], and by in-memory fakes in
/// [`crate::test_utils`].
pub trait ChainClient: Send + Sync {
    /// Returns the number of the most recent block.
    fn block_number(&self) -> impl Future<Output = eyre::Result<u64>> + Send;

    /// Returns the transaction hashes of the given block, or `None` if the
    /// node does not know the block.
    fn block_tx_hashes(
        &self,
        number: u64,
    ) -> impl Future<Output = eyre::Result<Option<Vec<TxHash>>>> + Send;

    /// Returns the transaction count of `address` at `block`.
    fn transaction_count(
        &self,
        address: Address,
        block: BlockId,
    ) -> impl Future<Output = eyre::Result<u64>> + Send;
}

impl<P> ChainClient for P
where
    P: Provider<Ethereum>,
{
    async fn block_number(&self) -> eyre::Result<u64> {
        Ok(self.get_block_number().await?)
    }

    async fn block_tx_hashes(&self, number: u64) -> eyre::Result<Option<Vec<TxHash>>> {
        let block = self.get_block_by_number(BlockNumberOrTag::Number(number)).await?;
        Ok(block.map(|block| block.transactions.hashes().collect()))
    }

    async fn transaction_count(&self, address: Address, block: BlockId) -> eyre::Result<u64> {
        Ok(self.get_transaction_count(address).block_id(block).await?)
    }
}
