use serde_json::{Map, Value};
use veille_logging::veille_warn;

const STATUS_SUCCESS: &str = "succes";
const STATUS_ERROR: &str = "erreur";

/// Client-side copy of the backend's bulk job record.
///
/// Only `running`, `error` and `result` drive supervision; the other fields
/// are kept as raw JSON so an unexpected type there never hides a job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobSnapshot {
    pub id: Option<Value>,
    /// A record without this field is still considered in flight.
    pub running: bool,
    pub started_at: Option<Value>,
    pub finished_at: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl JobSnapshot {
    /// Reads the `job` member of a launch or status response.
    ///
    /// Returns `None` when the member is absent, null, or not an object.
    pub fn from_envelope(body: &Value) -> Option<Self> {
        match body.get("job")? {
            Value::Null => None,
            Value::Object(record) => Some(Self::from_record(record)),
            other => {
                veille_warn!("Ignoring job record that is not an object: {}", other);
                None
            }
        }
    }

    fn from_record(record: &Map<String, Value>) -> Self {
        let present = |key: &str| record.get(key).filter(|value| !value.is_null()).cloned();
        let running = match record.get("running") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(running)) => *running,
            Some(other) => {
                veille_warn!("Job field `running` is not a boolean ({}); still polling", other);
                true
            }
        };
        let error = match record.get("error") {
            None | Some(Value::Null) => None,
            Some(Value::String(error)) => Some(error.clone()),
            Some(other) => Some(other.to_string()),
        };

        Self {
            id: present("id"),
            running,
            started_at: present("started_at"),
            finished_at: present("finished_at"),
            result: present("result"),
            error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !self.running
    }

    /// The job's error text, ignoring empty strings.
    pub fn failure(&self) -> Option<&str> {
        self.error.as_deref().filter(|error| !error.is_empty())
    }

    pub fn tally(&self) -> JobTally {
        JobTally::from_result(self.result.as_ref())
    }
}

/// Per-source success/error counts of a finished bulk job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobTally {
    pub succeeded: usize,
    pub failed: usize,
}

impl JobTally {
    /// Counts `result.results` entries.
    ///
    /// An entry succeeded when its nested `result.statut` is `succes`; it
    /// failed when its own or nested `statut` is `erreur`.
    pub fn from_result(result: Option<&Value>) -> Self {
        let entries = result
            .and_then(|result| result.get("results"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let succeeded = entries
            .iter()
            .filter(|entry| nested_status(entry) == Some(STATUS_SUCCESS))
            .count();
        let failed = entries
            .iter()
            .filter(|entry| {
                entry.get("statut").and_then(Value::as_str) == Some(STATUS_ERROR)
                    || nested_status(entry) == Some(STATUS_ERROR)
            })
            .count();

        Self { succeeded, failed }
    }
}

fn nested_status(entry: &Value) -> Option<&str> {
    entry
        .get("result")
        .and_then(|nested| nested.get("statut"))
        .and_then(Value::as_str)
}
