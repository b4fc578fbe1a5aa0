use crate::{
    classify_failure, text, Effect, FailureClass, FailureReason, Msg, Notification, Phase,
    Supervision,
};

/// Pure transition function: applies a message to a supervision and returns
/// the effects the driver must run next.
///
/// Messages that do not fit the current phase are ignored.
pub fn update(mut state: Supervision, msg: Msg) -> (Supervision, Vec<Effect>) {
    let effects = match (state.phase().clone(), msg) {
        (Phase::Idle, Msg::LaunchRequested { credential_held }) => {
            if credential_held {
                state.set_phase(Phase::Launching);
                vec![Effect::SendLaunch]
            } else {
                state.set_phase(Phase::Failed {
                    class: FailureClass::AdminRequired,
                    reason: FailureReason::NoCredential,
                });
                vec![Effect::Notify(Notification::warning(text::ADMIN_REQUIRED))]
            }
        }
        (Phase::Launching, Msg::Launched { response }) => {
            state.record_launch(response);
            state.set_phase(Phase::Polling);
            schedule_poll(&mut state)
        }
        (Phase::Polling, Msg::PollDue) => vec![Effect::QueryStatus],
        (Phase::Polling, Msg::StatusReceived { response }) => {
            state.record_status(&response);
            match state.job().filter(|job| job.is_terminal()).cloned() {
                Some(job) => match job.failure() {
                    Some(error) => {
                        state.set_phase(Phase::Failed {
                            class: FailureClass::Generic,
                            reason: FailureReason::Job(error.to_string()),
                        });
                        vec![Effect::Notify(Notification::error(text::job_failed(error)))]
                    }
                    None => {
                        let tally = job.tally();
                        state.set_phase(Phase::Completed { tally });
                        vec![Effect::Notify(Notification::success(text::bulk_summary(
                            tally,
                        )))]
                    }
                },
                None => schedule_poll(&mut state),
            }
        }
        (Phase::Launching | Phase::Polling, Msg::RequestFailed { status, message }) => {
            let class = classify_failure(status, &message);
            state.set_phase(Phase::Failed {
                class,
                reason: FailureReason::Request { status, message },
            });
            vec![Effect::Notify(class.notification(text::BULK_FAILED))]
        }
        _ => Vec::new(),
    };

    (state, effects)
}

fn schedule_poll(state: &mut Supervision) -> Vec<Effect> {
    let policy = state.policy();
    if state.polls() >= policy.ceiling {
        state.set_phase(Phase::TimedOut);
        vec![Effect::Notify(Notification::warning(text::STATUS_UNAVAILABLE))]
    } else {
        vec![Effect::Wait(policy.interval)]
    }
}
