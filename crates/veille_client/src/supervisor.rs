use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use veille_core::{
    classify_failure, text, update, Effect, FailureReason, JobSnapshot, JobTally, Msg,
    Notification, Phase, PollPolicy, Supervision,
};
use veille_logging::{veille_debug, veille_info, veille_warn};

use crate::{ApiError, CallOptions, Coordinator, RequestClient};

pub const LAUNCH_ENDPOINT: &str = "/scheduler/executer-tous/async";
pub const STATUS_ENDPOINT: &str = "/scheduler/executer-tous/status";

pub fn single_job_endpoint(key: &str) -> String {
    format!("/scheduler/executer/{key}")
}

/// Waits between status polls.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How a bulk supervision ended without raising.
#[derive(Debug, Clone, PartialEq)]
pub enum SupervisionOutcome {
    Completed {
        job: JobSnapshot,
        tally: JobTally,
    },
    /// The backend finished the job and reported an error for it.
    JobFailed {
        job: Option<JobSnapshot>,
        error: String,
    },
    /// Poll ceiling reached before the job finished.
    TimedOut {
        launch_response: Value,
        last_job: Option<JobSnapshot>,
    },
    /// Another supervision held the session; nothing was sent.
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    #[error("Accès admin requis")]
    AdminAccessRequired,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SupervisorError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SupervisorError::Api(err) => err.status(),
            SupervisorError::AdminAccessRequired => None,
        }
    }
}

/// Holds the single-flight flag for one supervision.
///
/// Dropping it releases the flag and clears every loading span.
struct ActiveSession<'a> {
    active: &'a AtomicBool,
    coordinator: &'a Coordinator,
}

impl<'a> ActiveSession<'a> {
    fn acquire(active: &'a AtomicBool, coordinator: &'a Coordinator) -> Option<Self> {
        active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                active,
                coordinator,
            })
    }
}

impl Drop for ActiveSession<'_> {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
        self.coordinator.force_reset();
    }
}

/// Launches scraping jobs and follows the bulk job until it ends.
pub struct JobSupervisor {
    client: Arc<RequestClient>,
    coordinator: Arc<Coordinator>,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
    active: AtomicBool,
}

impl JobSupervisor {
    pub fn new(
        client: Arc<RequestClient>,
        coordinator: Arc<Coordinator>,
        sleeper: Arc<dyn Sleeper>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            client,
            coordinator,
            sleeper,
            policy,
            active: AtomicBool::new(false),
        }
    }

    /// Whether a bulk supervision currently holds the session.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Starts the bulk job and polls it to a terminal state.
    ///
    /// The job's own failure and the poll timeout are returned as outcomes;
    /// a missing credential or a failed call is returned as an error after
    /// its toast was shown.
    pub async fn run_all(&self) -> Result<SupervisionOutcome, SupervisorError> {
        let Some(_session) = ActiveSession::acquire(&self.active, &self.coordinator) else {
            veille_warn!("Bulk job launch rejected: a supervision is already running");
            self.coordinator
                .notify(Notification::warning(text::ALREADY_RUNNING));
            return Ok(SupervisionOutcome::AlreadyRunning);
        };
        let _span = self.coordinator.begin_span(Some(text::BULK_LOADING));

        let mut machine = Supervision::new(self.policy);
        let mut pending = VecDeque::new();
        let mut failure: Option<ApiError> = None;
        let mut next = Some(Msg::LaunchRequested {
            credential_held: self.client.has_credential(),
        });

        while let Some(msg) = next.take() {
            let (state, effects) = update(machine, msg);
            machine = state;
            pending.extend(effects);

            while next.is_none() {
                let Some(effect) = pending.pop_front() else {
                    break;
                };
                next = self.run_effect(effect, &mut failure).await;
            }
        }

        veille_info!(
            "Bulk supervision ended in {:?} after {} polls",
            machine.phase(),
            machine.polls()
        );
        into_outcome(machine, failure)
    }

    async fn run_effect(&self, effect: Effect, failure: &mut Option<ApiError>) -> Option<Msg> {
        match effect {
            Effect::Notify(notification) => {
                self.coordinator.notify(notification);
                None
            }
            Effect::Wait(duration) => {
                self.sleeper.sleep(duration).await;
                Some(Msg::PollDue)
            }
            Effect::SendLaunch => {
                let result = self.client.call(LAUNCH_ENDPOINT, CallOptions::post()).await;
                Some(response_msg(result, failure, |response| Msg::Launched { response }))
            }
            Effect::QueryStatus => {
                let result = self.client.call(STATUS_ENDPOINT, CallOptions::get()).await;
                if let Ok(body) = &result {
                    veille_debug!("Bulk job status: {}", body);
                }
                Some(response_msg(result, failure, |response| Msg::StatusReceived {
                    response,
                }))
            }
        }
    }

    /// Runs one named scraper synchronously.
    pub async fn run_one(&self, key: &str) -> Result<Value, SupervisorError> {
        self.coordinator
            .with_span(Some(text::SINGLE_LOADING), async {
                match self
                    .client
                    .call(&single_job_endpoint(key), CallOptions::post())
                    .await
                {
                    Ok(body) => {
                        let message = body
                            .get("message")
                            .and_then(Value::as_str)
                            .unwrap_or(text::SINGLE_STARTED);
                        self.coordinator.notify(Notification::success(message));
                        Ok(body)
                    }
                    Err(err) => {
                        let class = classify_failure(err.status(), &err.to_string());
                        veille_warn!("Scraper {} failed ({:?}): {}", key, class, err);
                        self.coordinator
                            .notify(class.notification(text::SINGLE_FAILED));
                        Err(SupervisorError::from(err))
                    }
                }
            })
            .await
    }
}

fn response_msg(
    result: Result<Value, ApiError>,
    failure: &mut Option<ApiError>,
    on_success: impl FnOnce(Value) -> Msg,
) -> Msg {
    match result {
        Ok(body) => on_success(body),
        Err(err) => {
            let msg = Msg::RequestFailed {
                status: err.status(),
                message: err.to_string(),
            };
            *failure = Some(err);
            msg
        }
    }
}

/// Maps the final supervision to the caller's result.
///
/// A failed launch or status call always surfaces as the error the client
/// returned, so `AuthRejected` and transport errors keep their variant.
fn into_outcome(
    machine: Supervision,
    failure: Option<ApiError>,
) -> Result<SupervisionOutcome, SupervisorError> {
    if let Some(err) = failure {
        return Err(err.into());
    }
    let last_job = machine.job().cloned();
    match machine.phase().clone() {
        Phase::Completed { tally } => Ok(SupervisionOutcome::Completed {
            job: last_job.unwrap_or_default(),
            tally,
        }),
        Phase::Failed {
            reason: FailureReason::Job(error),
            ..
        } => Ok(SupervisionOutcome::JobFailed {
            job: last_job,
            error,
        }),
        Phase::TimedOut => Ok(SupervisionOutcome::TimedOut {
            launch_response: machine.launch_response().clone(),
            last_job,
        }),
        // Without a request error the loop only stops early on a missing
        // credential.
        _ => Err(SupervisorError::AdminAccessRequired),
    }
}
