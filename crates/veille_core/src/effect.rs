use std::time::Duration;

use crate::Notification;

/// Side effects requested by the supervision state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// POST the bulk job launch request.
    SendLaunch,
    /// Sleep before the next status query.
    Wait(Duration),
    /// GET the bulk job status.
    QueryStatus,
    Notify(Notification),
}
