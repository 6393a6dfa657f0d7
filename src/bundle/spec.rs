use alloy::{
    consensus::{TxEip1559, TxLegacy},
    primitives::{Address, Bytes, TxKind, U256},
};

/// The envelope format a transaction is signed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TxFormat {
    /// Pre-1559 transaction. `max_fee_per_gas` is used as the gas price.
    Legacy,
    /// EIP-1559 fee market transaction.
    #[default]
    Eip1559,
}

/// Parameters of a single bundle transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSpec {
    /// Call destination.
    pub to: Address,
    /// ABI encoded call data.
    pub input: Bytes,
    /// Wei sent with the call.
    pub value: U256,
    /// Chain the transaction is valid on.
    pub chain_id: u64,
    /// Gas limit.
    pub gas_limit: u64,
    /// Max fee per gas, in wei.
    pub max_fee_per_gas: u128,
    /// Max priority fee per gas, in wei. Ignored for legacy transactions.
    pub max_priority_fee_per_gas: u128,
    /// Envelope format.
    pub format: TxFormat,
    /// Explicit nonce. Filled from the chain at signing time when `None`.
    pub nonce: Option<u64>,
}

impl TransactionSpec {
    /// A zero-value EIP-1559 call to `to` with no gas parameters set.
    pub fn new(to: Address, input: impl Into<Bytes>, chain_id: u64) -> Self {
        Self {
            to,
            input: input.into(),
            value: U256::ZERO,
            chain_id,
            gas_limit: 0,
            max_fee_per_gas: 0,
            max_priority_fee_per_gas: 0,
            format: TxFormat::Eip1559,
            nonce: None,
        }
    }

    /// Sets the value.
    pub const fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Sets the gas limit.
    pub const fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Sets the max fee and max priority fee per gas.
    pub const fn with_fees(mut self, max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        self.max_fee_per_gas = max_fee_per_gas;
        self.max_priority_fee_per_gas = max_priority_fee_per_gas;
        self
    }

    /// Sets the envelope format.
    pub const fn with_format(mut self, format: TxFormat) -> Self {
        self.format = format;
        self
    }

    /// Pins the nonce instead of reading it from the chain.
    pub const fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub(crate) fn to_legacy(&self, nonce: u64) -> TxLegacy {
        TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price: self.max_fee_per_gas,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.to),
            value: self.value,
            input: self.input.clone(),
        }
    }

    pub(crate) fn to_eip1559(&self, nonce: u64) -> TxEip1559 {
        TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            gas_limit: self.gas_limit,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            to: TxKind::Call(self.to),
            value: self.value,
            input: self.input.clone(),
            ..Default::default()
        }
    }
}
