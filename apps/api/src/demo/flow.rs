//! Demo input lifecycle: a visitor submits a CV, waits for it to be
//! processed, then reviews, regenerates or discards the result.
//!
//! Only one request may be in flight; the transition function rejects a
//! second submission while one is processing.

use thiserror::Error;

use crate::errors::AppError;
use crate::profile::ProfileOverride;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DemoFlow {
    #[default]
    Empty,
    Processing,
    Ready(ProfileOverride),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DemoEvent {
    Submit,
    Completed(ProfileOverride),
    Failed,
    Regenerate,
    Reset,
}

#[derive(Debug, Error, PartialEq)]
#[error("cannot apply '{event}' while {state}")]
pub struct InvalidTransition {
    pub state: &'static str,
    pub event: &'static str,
}

impl DemoFlow {
    pub fn name(&self) -> &'static str {
        match self {
            DemoFlow::Empty => "empty",
            DemoFlow::Processing => "processing",
            DemoFlow::Ready(_) => "ready",
        }
    }

    /// The structured CV, once processing has completed.
    pub fn into_override(self) -> Option<ProfileOverride> {
        match self {
            DemoFlow::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn transition(self, event: DemoEvent) -> Result<DemoFlow, InvalidTransition> {
        match (self, event) {
            (DemoFlow::Empty, DemoEvent::Submit) => Ok(DemoFlow::Processing),
            (DemoFlow::Processing, DemoEvent::Completed(data)) => Ok(DemoFlow::Ready(data)),
            (DemoFlow::Processing, DemoEvent::Failed) => Ok(DemoFlow::Empty),
            (DemoFlow::Ready(_), DemoEvent::Regenerate) => Ok(DemoFlow::Processing),
            (DemoFlow::Ready(_), DemoEvent::Reset) => Ok(DemoFlow::Empty),
            (state, event) => Err(InvalidTransition {
                state: state.name(),
                event: event.name(),
            }),
        }
    }
}

impl DemoEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DemoEvent::Submit => "submit",
            DemoEvent::Completed(_) => "completed",
            DemoEvent::Failed => "failed",
            DemoEvent::Regenerate => "regenerate",
            DemoEvent::Reset => "reset",
        }
    }
}

impl From<InvalidTransition> for AppError {
    fn from(err: InvalidTransition) -> Self {
        AppError::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProfileOverride {
        ProfileOverride {
            profile_summary: Some("Engineer".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_happy_path_and_regenerate() {
        let flow = DemoFlow::default()
            .transition(DemoEvent::Submit)
            .unwrap();
        assert_eq!(flow, DemoFlow::Processing);

        let flow = flow.transition(DemoEvent::Completed(sample())).unwrap();
        assert_eq!(flow.name(), "ready");

        let flow = flow.transition(DemoEvent::Regenerate).unwrap();
        assert_eq!(flow, DemoFlow::Processing);
    }

    #[test]
    fn test_into_override_only_when_ready() {
        assert_eq!(DemoFlow::Ready(sample()).into_override(), Some(sample()));
        assert_eq!(DemoFlow::Processing.into_override(), None);
        assert_eq!(DemoFlow::Empty.into_override(), None);
    }

    #[test]
    fn test_invalid_transition_is_internal_error() {
        let err: AppError = DemoFlow::Empty.transition(DemoEvent::Failed).unwrap_err().into();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.to_string().contains("cannot apply 'failed' while empty"));
    }

    #[test]
    fn test_failure_and_reset_return_to_empty() {
        let failed = DemoFlow::Processing.transition(DemoEvent::Failed).unwrap();
        assert_eq!(failed, DemoFlow::Empty);

        let reset = DemoFlow::Ready(sample()).transition(DemoEvent::Reset).unwrap();
        assert_eq!(reset, DemoFlow::Empty);
    }

    #[test]
    fn test_submit_while_processing_rejected() {
        let err = DemoFlow::Processing
            .transition(DemoEvent::Submit)
            .unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                state: "processing",
                event: "submit"
            }
        );
        assert_eq!(err.to_string(), "cannot apply 'submit' while processing");
    }

    #[test]
    fn test_other_invalid_transitions() {
        assert!(DemoFlow::Empty.transition(DemoEvent::Reset).is_err());
        assert!(DemoFlow::Empty.transition(DemoEvent::Completed(sample())).is_err());
        assert!(DemoFlow::Ready(sample()).transition(DemoEvent::Submit).is_err());
    }
}
