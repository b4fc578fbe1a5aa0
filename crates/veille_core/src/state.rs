use std::time::Duration;

use serde_json::Value;

use crate::{FailureClass, JobSnapshot, JobTally};

/// Maximum number of status queries per supervision.
pub const POLL_CEILING: u32 = 180;
/// Wait before each status query.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub ceiling: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            ceiling: POLL_CEILING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Launch attempted without a held credential.
    NoCredential,
    /// The backend reported the job itself as failed.
    Job(String),
    /// A launch or status call failed.
    Request {
        status: Option<u16>,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Launching,
    Polling,
    Completed {
        tally: JobTally,
    },
    Failed {
        class: FailureClass,
        reason: FailureReason,
    },
    TimedOut,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Phase::Completed { .. } | Phase::Failed { .. } | Phase::TimedOut
        )
    }
}

/// One bulk job supervision, from launch request to terminal phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Supervision {
    policy: PollPolicy,
    phase: Phase,
    launch_response: Value,
    job: Option<JobSnapshot>,
    polls: u32,
}

impl Default for Supervision {
    fn default() -> Self {
        Self::new(PollPolicy::default())
    }
}

impl Supervision {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            phase: Phase::Idle,
            launch_response: Value::Null,
            job: None,
            polls: 0,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Body of the successful launch call, `Null` before launch.
    pub fn launch_response(&self) -> &Value {
        &self.launch_response
    }

    /// Latest job snapshot seen, from the launch or the last status query.
    pub fn job(&self) -> Option<&JobSnapshot> {
        self.job.as_ref()
    }

    /// Status responses received so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn record_launch(&mut self, response: Value) {
        self.job = JobSnapshot::from_envelope(&response);
        self.launch_response = response;
    }

    pub(crate) fn record_status(&mut self, response: &Value) {
        self.polls += 1;
        self.job = JobSnapshot::from_envelope(response);
    }
}
