//! Displayed-state machine for deal analysis: `Idle -> Loading -> {Success, Failed}`.
//!
//! Every `begin` bumps a generation counter and hands out a [`Ticket`]. An
//! outcome is only applied when its ticket is still current, so a slow reply
//! to a superseded query can never overwrite a newer result.

use super::error::AnalysisError;
use super::models::DealAnalysisResponse;
use tracing::debug;

/// What is currently shown for the analysis panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnalysisState {
    #[default]
    Idle,
    Loading {
        query: String,
    },
    Success(Box<DealAnalysisResponse>),
    Failed(AnalysisError),
}

impl AnalysisState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AnalysisState::Loading { .. })
    }
}

/// Identity of one submitted query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    query: String,
}

impl Ticket {
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Last-write-wins holder of the displayed analysis state.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    generation: u64,
    state: AnalysisState,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    /// Starts a query, superseding any pending one.
    ///
    /// Blank queries are rejected and leave the state untouched.
    pub fn begin(&mut self, query: &str) -> Result<Ticket, AnalysisError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AnalysisError::Input);
        }

        self.generation += 1;
        self.state = AnalysisState::Loading { query: query.to_string() };
        debug!("Query generation {} started: {}", self.generation, query);

        Ok(Ticket { generation: self.generation, query: query.to_string() })
    }

    /// Applies an outcome if `ticket` is still current. Returns whether it was applied.
    pub fn finish(
        &mut self,
        ticket: &Ticket,
        outcome: Result<DealAnalysisResponse, AnalysisError>,
    ) -> bool {
        if ticket.generation != self.generation || !self.state.is_loading() {
            debug!(
                "Discarding stale outcome for '{}' (generation {}, current {})",
                ticket.query, ticket.generation, self.generation
            );
            return false;
        }

        self.state = match outcome {
            Ok(response) => AnalysisState::Success(Box::new(response)),
            Err(err) => AnalysisState::Failed(err),
        };
        true
    }

    /// Clears the displayed result and invalidates any pending ticket.
    pub fn dismiss(&mut self) {
        self.generation += 1;
        self.state = AnalysisState::Idle;
    }

    /// Takes the successful result, leaving the session idle.
    pub fn take_result(&mut self) -> Option<DealAnalysisResponse> {
        match std::mem::take(&mut self.state) {
            AnalysisState::Success(response) => Some(*response),
            other => {
                self.state = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::fixtures::sample_response;

    #[test]
    fn test_initial_state_idle() {
        let session = AnalysisSession::new();
        assert_eq!(session.state(), &AnalysisState::Idle);
    }

    #[test]
    fn test_begin_and_success() {
        let mut session = AnalysisSession::new();
        let ticket = session.begin("  iPhone 16  ").unwrap();
        assert_eq!(ticket.query(), "iPhone 16");
        assert!(session.state().is_loading());

        assert!(session.finish(&ticket, Ok(sample_response())));
        assert!(matches!(session.state(), AnalysisState::Success(_)));
    }

    #[test]
    fn test_failure_state() {
        let mut session = AnalysisSession::new();
        let ticket = session.begin("x").unwrap();
        assert!(session.finish(&ticket, Err(AnalysisError::Network("down".into()))));
        assert!(matches!(session.state(), AnalysisState::Failed(AnalysisError::Network(_))));
    }

    #[test]
    fn test_blank_query_rejected() {
        let mut session = AnalysisSession::new();
        assert_eq!(session.begin("   ").unwrap_err(), AnalysisError::Input);
        assert_eq!(session.state(), &AnalysisState::Idle);
    }

    #[test]
    fn test_stale_outcome_discarded() {
        let mut session = AnalysisSession::new();
        let first = session.begin("first").unwrap();
        let second = session.begin("second").unwrap();

        assert!(session.finish(&second, Ok(sample_response())));
        // Slow reply for the superseded query arrives late.
        assert!(!session.finish(&first, Err(AnalysisError::Parse("late".into()))));
        assert!(matches!(session.state(), AnalysisState::Success(_)));
    }

    #[test]
    fn test_stale_outcome_does_not_end_loading() {
        let mut session = AnalysisSession::new();
        let first = session.begin("first").unwrap();
        let _second = session.begin("second").unwrap();

        assert!(!session.finish(&first, Ok(sample_response())));
        assert_eq!(session.state(), &AnalysisState::Loading { query: "second".to_string() });
    }

    #[test]
    fn test_dismiss_invalidates_pending() {
        let mut session = AnalysisSession::new();
        let ticket = session.begin("x").unwrap();
        session.dismiss();

        assert!(!session.finish(&ticket, Ok(sample_response())));
        assert_eq!(session.state(), &AnalysisState::Idle);
    }

    #[test]
    fn test_double_finish_ignored() {
        let mut session = AnalysisSession::new();
        let ticket = session.begin("x").unwrap();
        assert!(session.finish(&ticket, Ok(sample_response())));
        assert!(!session.finish(&ticket, Err(AnalysisError::Network("again".into()))));
        assert!(matches!(session.state(), AnalysisState::Success(_)));
    }

    #[test]
    fn test_take_result() {
        let mut session = AnalysisSession::new();
        let ticket = session.begin("x").unwrap();
        assert!(session.take_result().is_none());
        assert!(session.state().is_loading());

        session.finish(&ticket, Ok(sample_response()));
        assert_eq!(session.take_result(), Some(sample_response()));
        assert_eq!(session.state(), &AnalysisState::Idle);
    }
}
