use crate::{
    constants::{
        EXIT_EXHAUSTED_RETRIES, EXIT_NONCE_TOO_HIGH, EXIT_PROVIDER_UNAVAILABLE,
        EXIT_SUBMISSION_FAILED,
    },
    provider::ProviderUnavailable,
    relay::RelayError,
    tasks::{resolve::ResolutionError, simulate::SimulationError},
};

/// Ways a submission run can end without inclusion.
#[derive(thiserror::Error, Debug)]
pub enum SubmissionError {
    /// No RPC endpoint could be reached. Fatal.
    #[error(transparent)]
    ProviderUnavailable(#[from] ProviderUnavailable),

    /// Simulation failed under the blocking policy.
    #[error("bundle simulation failed: {0}")]
    SimulationFailed(#[from] SimulationError),

    /// The relay rejected the submission. Not retried.
    #[error("bundle rejected for block {block}: {reason}")]
    SubmissionRejected {
        /// Target block of the rejected submission.
        block: u64,
        /// The relay's error.
        reason: RelayError,
    },

    /// A bundle nonce was consumed elsewhere. Fatal.
    #[error("bundle nonce consumed while targeting block {block}, inclusion is impossible")]
    NonceTooHigh {
        /// Target block of the attempt that detected it.
        block: u64,
    },

    /// Every block in the window passed without inclusion.
    #[error("bundle not included in {attempts} blocks starting at {start_block}")]
    ExhaustedRetries {
        /// First target block.
        start_block: u64,
        /// Number of submissions made.
        attempts: u64,
    },

    /// The chain or relay answered outside the defined protocol.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A network call failed.
    #[error("rpc error: {0}")]
    Rpc(eyre::Report),
}

impl From<ResolutionError> for SubmissionError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Rpc(err) => Self::Rpc(err),
            err @ ResolutionError::MissingBlock(_) => Self::UnexpectedResponse(err.to_string()),
        }
    }
}

impl SubmissionError {
    /// True for conditions where the process must stop rather than retry
    /// later.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_) | Self::NonceTooHigh { .. })
    }

    /// Process exit code for this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ExhaustedRetries { .. } => EXIT_EXHAUSTED_RETRIES,
            Self::NonceTooHigh { .. } => EXIT_NONCE_TOO_HIGH,
            Self::ProviderUnavailable(_) => EXIT_PROVIDER_UNAVAILABLE,
            Self::SimulationFailed(_)
            | Self::SubmissionRejected { .. }
            | Self::UnexpectedResponse(_)
            | Self::Rpc(_) => EXIT_SUBMISSION_FAILED,
        }
    }

    /// Process exit code for a report from anywhere in the pipeline. Setup
    /// failures that are not a [`SubmissionError`] exit with
    /// [`EXIT_SUBMISSION_FAILED`].
    pub fn exit_code_of(report: &eyre::Report) -> i32 {
        if let Some(err) = report.downcast_ref::<Self>() {
            return err.exit_code();
        }
        if report.downcast_ref::<ProviderUnavailable>().is_some() {
            return EXIT_PROVIDER_UNAVAILABLE;
        }
        EXIT_SUBMISSION_FAILED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_errors_exit_distinctly() {
        let exhausted = SubmissionError::ExhaustedRetries { start_block: 1, attempts: 3 };
        let nonce = SubmissionError::NonceTooHigh { block: 2 };
        let provider = SubmissionError::from(ProviderUnavailable { attempted: 3 });

        assert!(!exhausted.is_fatal());
        assert!(nonce.is_fatal());
        assert!(provider.is_fatal());

        assert_ne!(exhausted.exit_code(), 0);
        assert_ne!(exhausted.exit_code(), nonce.exit_code());
        assert_ne!(exhausted.exit_code(), provider.exit_code());
    }

    #[test]
    fn missing_block_is_unexpected_response() {
        let err = SubmissionError::from(ResolutionError::MissingBlock(9));
        assert!(matches!(err, SubmissionError::UnexpectedResponse(_)));
        assert_eq!(err.exit_code(), EXIT_SUBMISSION_FAILED);
    }

    #[test]
    fn report_exit_codes() {
        let nonce = eyre::Report::new(SubmissionError::NonceTooHigh { block: 2 });
        assert_eq!(SubmissionError::exit_code_of(&nonce), EXIT_NONCE_TOO_HIGH);

        let provider = eyre::Report::new(ProviderUnavailable { attempted: 2 });
        assert_eq!(SubmissionError::exit_code_of(&provider), EXIT_PROVIDER_UNAVAILABLE);

        let setup = eyre::eyre!("missing env var");
        assert_eq!(SubmissionError::exit_code_of(&setup), EXIT_SUBMISSION_FAILED);
    }
}
