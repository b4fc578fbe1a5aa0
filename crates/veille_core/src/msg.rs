use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Caller asked for a bulk launch.
    LaunchRequested { credential_held: bool },
    /// Launch call succeeded with this body.
    Launched { response: Value },
    /// The inter-poll wait elapsed.
    PollDue,
    /// Status call succeeded with this body.
    StatusReceived { response: Value },
    /// A launch or status call failed.
    RequestFailed {
        status: Option<u16>,
        message: String,
    },
}
