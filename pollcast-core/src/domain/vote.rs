use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::poll::{OptionId, PollId};
use crate::error::{PollError, Result};

pub const MAX_VOTER_TOKEN_LEN: usize = 128;

/// Opaque, unauthenticated identifier used only to deduplicate votes.
///
/// Tokens are self-issued and carry no link to a person; `Debug` redacts the
/// value so it never lands in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterToken(String);

impl VoterToken {
    pub fn issue() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a client-supplied token. Absent or blank tokens are rejected.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let token = raw.map(str::trim).unwrap_or_default();
        if token.is_empty() {
            return Err(PollError::InvalidRequest("Missing user token".into()));
        }
        if token.len() > MAX_VOTER_TOKEN_LEN {
            return Err(PollError::InvalidRequest("Voter token is too long".into()));
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VoterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VoterToken(..)")
    }
}

/// A vote ready to be appended to the ledger.
#[derive(Debug, Clone)]
pub struct NewVote {
    pub id: Uuid,
    pub poll_id: PollId,
    pub option_id: OptionId,
    pub voter_token: VoterToken,
    pub cast_at: DateTime<Utc>,
}

impl NewVote {
    pub fn new(poll_id: PollId, option_id: OptionId, voter_token: VoterToken) -> Self {
        Self {
            id: Uuid::now_v7(),
            poll_id,
            option_id,
            voter_token,
            cast_at: Utc::now(),
        }
    }
}

/// Result of the atomic ledger insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Committed,
    DuplicateVote,
}

/// Lifecycle of a single vote request.
///
/// `Received -> Validated -> Committed | RejectedDuplicate`, or
/// `Received -> RejectedInvalid`. Terminal states never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    Received,
    Validated,
    Committed,
    RejectedDuplicate,
    RejectedInvalid,
}

impl VoteState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            VoteState::Committed | VoteState::RejectedDuplicate | VoteState::RejectedInvalid
        )
    }

    pub fn validated(self, ok: bool) -> Self {
        match (self, ok) {
            (VoteState::Received, true) => VoteState::Validated,
            (VoteState::Received, false) => VoteState::RejectedInvalid,
            (state, _) => state,
        }
    }

    pub fn inserted(self, outcome: VoteOutcome) -> Self {
        match (self, outcome) {
            (VoteState::Validated, VoteOutcome::Committed) => VoteState::Committed,
            (VoteState::Validated, VoteOutcome::DuplicateVote) => VoteState::RejectedDuplicate,
            (state, _) => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_missing_or_blank_tokens() {
        assert!(matches!(
            VoterToken::parse(None),
            Err(PollError::InvalidRequest(_))
        ));
        assert!(matches!(
            VoterToken::parse(Some("  ")),
            Err(PollError::InvalidRequest(_))
        ));
        assert!(VoterToken::parse(Some(&"t".repeat(MAX_VOTER_TOKEN_LEN + 1))).is_err());
        assert_eq!(VoterToken::parse(Some("T1")).unwrap().as_str(), "T1");
    }

    #[test]
    fn issued_tokens_are_unrelated() {
        let first = VoterToken::issue();
        let second = VoterToken::issue();
        assert_ne!(first, second);
        assert!(Uuid::parse_str(first.as_str()).is_ok());
    }

    #[test]
    fn debug_output_hides_token_value() {
        let token = VoterToken::parse(Some("secret-token")).unwrap();
        assert!(!format!("{token:?}").contains("secret-token"));
    }

    #[test]
    fn state_machine_transitions() {
        let committed = VoteState::Received
            .validated(true)
            .inserted(VoteOutcome::Committed);
        assert_eq!(committed, VoteState::Committed);

        let duplicate = VoteState::Received
            .validated(true)
            .inserted(VoteOutcome::DuplicateVote);
        assert_eq!(duplicate, VoteState::RejectedDuplicate);

        let invalid = VoteState::Received.validated(false);
        assert_eq!(invalid, VoteState::RejectedInvalid);
        assert_eq!(invalid.inserted(VoteOutcome::Committed), VoteState::RejectedInvalid);

        for state in [committed, duplicate, invalid] {
            assert!(state.is_terminal());
            assert_eq!(state.validated(true), state);
        }
        assert!(!VoteState::Received.is_terminal());
        assert!(!VoteState::Validated.is_terminal());
    }
}
