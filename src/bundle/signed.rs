use super::{Bundle, BundleEntry, TxFormat};
use crate::chain::ChainClient;
use alloy::{
    consensus::{
        SignableTransaction, Signed, Transaction as _, TxEnvelope,
        transaction::SignerRecoverable,
    },
    eips::{BlockId, Decodable2718, Encodable2718},
    primitives::{Address, Bytes, Signature, TxHash},
    signers::Signer,
};
use tracing::{debug, instrument};
use std::collections::HashMap;

/// A signed, encoded bundle transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    /// Transaction hash.
    pub hash: TxHash,
    /// Sender address.
    pub from: Address,
    /// Nonce the transaction was signed with.
    pub nonce: u64,
    /// EIP-2718 encoded transaction.
    pub raw: Bytes,
}

impl SignedTx {
    /// Decodes an EIP-2718 encoded transaction and recovers its sender.
    pub fn decode(raw: Bytes) -> eyre::Result<Self> {
        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())?;
        let from = envelope.recover_signer()?;
        Ok(Self { hash: *envelope.tx_hash(), from, nonce: envelope.nonce(), raw })
    }
}

/// A bundle whose transactions are all signed.
///
/// Immutable and freely reusable: the same signed bundle is submitted
/// against every candidate block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBundle {
    txs: Vec<SignedTx>,
}

impl SignedBundle {
    /// Wraps already signed transactions, in execution order.
    pub const fn new(txs: Vec<SignedTx>) -> Self {
        Self { txs }
    }

    /// The signed transactions, in execution order.
    pub fn txs(&self) -> &[SignedTx] {
        &self.txs
    }

    /// Encoded transactions as sent to the relay.
    pub fn raw_txs(&self) -> Vec<Bytes> {
        self.txs.iter().map(|tx| tx.raw.clone()).collect()
    }

    /// Hashes of the bundle transactions.
    pub fn tx_hashes(&self) -> impl Iterator<Item = TxHash> + '_ {
        self.txs.iter().map(|tx| tx.hash)
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    /// True if the bundle holds no transactions.
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}

impl<S> Bundle<S>
where
    S: Signer + Send + Sync,
{
    /// Signs every entry with its own signer.
    ///
    /// Entries without an explicit nonce get their account's pending nonce,
    /// read once per account, then consecutive nonces for later entries from
    /// the same account. Presigned entries are carried unchanged, and later
    /// entries from their sender continue after their nonce.
    #[instrument(skip_all, fields(txs = self.len()))]
    pub async fn sign<C: ChainClient>(&self, chain: &C) -> eyre::Result<SignedBundle> {
        let mut next_nonce: HashMap<Address, u64> = HashMap::new();
        let mut txs = Vec::with_capacity(self.len());

        for entry in self.entries() {
            let (spec, signer) = match entry {
                BundleEntry::Unsigned { spec, signer } => (spec, signer),
                BundleEntry::Presigned(tx) => {
                    debug!(hash = %tx.hash, from = %tx.from, nonce = tx.nonce, "carrying presigned transaction");
                    next_nonce.insert(tx.from, tx.nonce + 1);
                    txs.push(tx.clone());
                    continue;
                }
            };

            let from = signer.address();
            let nonce = match (spec.nonce, next_nonce.get(&from)) {
                (Some(nonce), _) => nonce,
                (None, Some(&nonce)) => nonce,
                (None, None) => chain.transaction_count(from, BlockId::pending()).await?,
            };
            next_nonce.insert(from, nonce + 1);

            let envelope = match spec.format {
                TxFormat::Legacy => sign_tx(spec.to_legacy(nonce), signer).await?,
                TxFormat::Eip1559 => sign_tx(spec.to_eip1559(nonce), signer).await?,
            };

            let hash = *envelope.tx_hash();
            debug!(%hash, %from, nonce, "signed bundle transaction");
            txs.push(SignedTx { hash, from, nonce, raw: envelope.encoded_2718().into() });
        }

        Ok(SignedBundle::new(txs))
    }
}

async fn sign_tx<T, S>(tx: T, signer: &S) -> eyre::Result<TxEnvelope>
where
    T: SignableTransaction<Signature>,
    Signed<T>: Into<TxEnvelope>,
    S: Signer + Send + Sync,
{
    let signature = signer.sign_hash(&tx.signature_hash()).await?;
    Ok(tx.into_signed(signature).into())
}
