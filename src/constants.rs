//! Constants used in the submitter.

/// Sepolia chain ID, the default network for bundle transactions.
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

/// Public Sepolia endpoints tried after the primary RPC URL when no
/// fallbacks are configured.
pub const DEFAULT_FALLBACK_RPC_URLS: &[&str] =
    &["https://ethereum-sepolia-rpc.publicnode.com", "https://rpc2.sepolia.org"];

/// Default number of candidate blocks a bundle is submitted against.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 10;

/// Header carrying the relay signature of a request body.
pub const FLASHBOTS_SIGNATURE_HEADER: &str = "X-Flashbots-Signature";

/// Exit code when the block window closed without inclusion. Retrying later
/// may succeed.
pub const EXIT_EXHAUSTED_RETRIES: i32 = 1;
/// Exit code for rejected submissions, RPC failures and setup errors.
pub const EXIT_SUBMISSION_FAILED: i32 = 2;
/// Exit code when a bundle nonce was consumed elsewhere.
pub const EXIT_NONCE_TOO_HIGH: i32 = 3;
/// Exit code when no RPC endpoint could be reached.
pub const EXIT_PROVIDER_UNAVAILABLE: i32 = 4;
