use super::{SignedTx, TransactionSpec};
use alloy::primitives::Bytes;

/// Errors raised while assembling a bundle.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BundleError {
    /// A bundle needs at least one transaction.
    #[error("bundle contains no transactions")]
    Empty,

    /// A pre-signed transaction could not be decoded or its signer
    /// recovered.
    #[error("raw transaction at position {index} is invalid: {reason}")]
    InvalidRaw {
        /// Position of the transaction in the bundle.
        index: usize,
        /// Decoding or recovery error.
        reason: String,
    },
}

/// One position in a bundle.
#[derive(Debug, Clone)]
pub enum BundleEntry<S> {
    /// A transaction signed at bundle signing time.
    Unsigned {
        /// Transaction parameters.
        spec: TransactionSpec,
        /// Signer for this transaction.
        signer: S,
    },
    /// A transaction signed elsewhere, such as a pending transaction being
    /// backrun. Carried unchanged.
    Presigned(SignedTx),
}

/// An ordered, non-empty set of transactions to be included atomically.
///
/// Entry order is the execution order within the target block.
#[derive(Debug, Clone)]
pub struct Bundle<S> {
    entries: Vec<BundleEntry<S>>,
}

impl<S> Bundle<S> {
    /// The entries, in execution order.
    pub fn entries(&self) -> &[BundleEntry<S>] {
        &self.entries
    }

    /// Number of transactions in the bundle.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a built bundle.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects bundle entries in caller order.
#[derive(Debug, Clone)]
pub struct BundleBuilder<S> {
    entries: Vec<BundleEntry<S>>,
}

impl<S> Default for BundleBuilder<S> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<S> BundleBuilder<S> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transaction to be signed by `signer`.
    pub fn push(mut self, spec: TransactionSpec, signer: S) -> Self {
        self.entries.push(BundleEntry::Unsigned { spec, signer });
        self
    }

    /// Appends an already signed, EIP-2718 encoded transaction. Its sender
    /// and nonce are recovered so later entries from the same account
    /// continue after it.
    pub fn push_raw(mut self, raw: impl Into<Bytes>) -> Result<Self, BundleError> {
        let index = self.entries.len();
        let tx = SignedTx::decode(raw.into())
            .map_err(|err| BundleError::InvalidRaw { index, reason: err.to_string() })?;
        self.entries.push(BundleEntry::Presigned(tx));
        Ok(self)
    }

    /// Appends every spec, looking up each one's signer with `signer_for`.
    pub fn extend<I, F>(mut self, specs: I, mut signer_for: F) -> Self
    where
        I: IntoIterator<Item = TransactionSpec>,
        F: FnMut(usize, &TransactionSpec) -> S,
    {
        let offset = self.entries.len();
        for (i, spec) in specs.into_iter().enumerate() {
            let signer = signer_for(offset + i, &spec);
            self.entries.push(BundleEntry::Unsigned { spec, signer });
        }
        self
    }

    /// Finishes the bundle.
    pub fn build(self) -> Result<Bundle<S>, BundleError> {
        if self.entries.is_empty() {
            return Err(BundleError::Empty);
        }
        Ok(Bundle { entries: self.entries })
    }
}
