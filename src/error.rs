//! Terminal failure conditions.
//!
//! Everything recoverable is handled inside the controller and only logged.
//! The conditions below end the process; `main` downcasts them out of
//! `anyhow::Error` to choose the exit status.

/// A failure the controller does not recover from.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    /// The reconnect cap was reached without a successful connection.
    #[error("Unable to connect after {attempts} attempts, giving up")]
    GaveUp {
        /// Consecutive attempts made before giving up.
        attempts: u32,
    },

    /// The audio bridge could not open a stream on a live connection.
    #[error("Stream open error ({0})")]
    StreamOpen(String),
}

impl FatalError {
    /// Process exit status reported for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
