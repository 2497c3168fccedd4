use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Result, RunnerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One validated request for a worker run.
///
/// No `Deserialize`: requests are only built through [`JobRequest::new`], so
/// a constructed request always carries a non-empty goal.
#[derive(Debug, Clone, Serialize)]
pub struct JobRequest {
    pub id: Uuid,
    pub goal: String,
    pub created_at: DateTime<Utc>,
}

impl JobRequest {
    /// Validate and wrap a goal. Empty (or whitespace-only) goals are
    /// rejected here, before any process is spawned.
    pub fn new(goal: impl Into<String>) -> Result<Self> {
        let goal = goal.into();
        if goal.trim().is_empty() {
            return Err(RunnerError::InvalidRequest);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            goal,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_keeps_goal_verbatim() {
        let request = JobRequest::new("rank candidates for ml research").unwrap();
        assert_eq!(request.goal, "rank candidates for ml research");
    }

    #[test]
    fn empty_goal_is_rejected() {
        assert!(matches!(
            JobRequest::new(""),
            Err(RunnerError::InvalidRequest)
        ));
    }

    #[test]
    fn whitespace_goal_is_rejected() {
        assert!(matches!(
            JobRequest::new("   \n\t"),
            Err(RunnerError::InvalidRequest)
        ));
    }

    #[test]
    fn requests_get_distinct_ids() {
        let a = JobRequest::new("goal").unwrap();
        let b = JobRequest::new("goal").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn status_display_is_lowercase() {
        assert_eq!(JobStatus::Running.to_string(), "running");
        assert_eq!(JobStatus::Completed.to_string(), "completed");
        assert_eq!(JobStatus::Failed.to_string(), "failed");
    }
}
