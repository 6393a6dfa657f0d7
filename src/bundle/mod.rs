//! Bundle assembly and signing.
//!
//! A [`Bundle`] is an ordered list of [`TransactionSpec`]s, each paired with
//! the signer that must authorize it, and of transactions already signed
//! elsewhere. Signing the bundle resolves nonces and produces a
//! [`SignedBundle`], the unit passed to the relay.

mod builder;
pub use builder::{Bundle, BundleBuilder, BundleEntry, BundleError};

mod signed;
pub use signed::{SignedBundle, SignedTx};

mod spec;
pub use spec::{TransactionSpec, TxFormat};
