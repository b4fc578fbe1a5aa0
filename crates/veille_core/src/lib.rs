//! Veille core: pure supervision state machine and notification bookkeeping.
mod classify;
mod effect;
mod job;
mod loading;
mod msg;
mod notification;
mod state;
pub mod text;
mod update;

pub use classify::{classify_failure, is_token_problem, FailureClass, TOKEN_PATTERNS};
pub use effect::Effect;
pub use job::{JobSnapshot, JobTally};
pub use loading::{LoadingIndicator, DEFAULT_LOADING_LABEL};
pub use msg::Msg;
pub use notification::{Notification, NotificationKind, Toast, ToastId, ToastQueue, TOAST_DURATION};
pub use state::{FailureReason, Phase, PollPolicy, Supervision, POLL_CEILING, POLL_INTERVAL};
pub use update::update;
