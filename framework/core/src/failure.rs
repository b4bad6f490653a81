/// The reason an invocation was counted against a scenario's error rate.
///
/// None of these stop a run. They only decide which bucket a failed outcome lands in when the
/// end-of-run summary is printed.
#[derive(derive_more::Display, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// The request never produced a status code, for example a refused connection or a timeout.
    #[display("network_failure")]
    NetworkFailure,
    /// A 429 response while the scenario is not rate-limit aware.
    #[display("throttled")]
    ThrottleResponse,
    /// A response that does not satisfy the protocol the scenario expects, such as a redirect
    /// without a `Location` header.
    #[display("protocol_violation")]
    ProtocolViolation,
    /// Any other status outside the scenario's success set.
    #[display("unexpected_status")]
    UnexpectedStatus,
    /// The invocation was still in flight when the run's grace period expired.
    #[display("abandoned")]
    Abandoned,
}

#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct ShutdownSignalError {
    msg: String,
}

impl Default for ShutdownSignalError {
    fn default() -> Self {
        Self {
            msg: "Run cancelled by shutdown signal".to_string(),
        }
    }
}
