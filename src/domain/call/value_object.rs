//! Call value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a voice call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallState {
    /// Registered but the provider has not confirmed the call yet
    AwaitingCall,
    /// Provider reported the call as started
    CallStarted,
    /// Caller context is loaded, waiting for the next request
    AwaitingIntent,
    /// A backend request is in flight
    ProcessingRequest,
    /// Backend answered, reply is being prepared
    GeneratingResponse,
    /// Reply is being spoken to the caller
    SpeakingResponse,
    /// Provider reported the call as ended
    CallEnded,
}

impl CallState {
    pub const ALL: [CallState; 7] = [
        CallState::AwaitingCall,
        CallState::CallStarted,
        CallState::AwaitingIntent,
        CallState::ProcessingRequest,
        CallState::GeneratingResponse,
        CallState::SpeakingResponse,
        CallState::CallEnded,
    ];

    /// States reachable in one step from `self`
    pub fn successors(&self) -> &'static [CallState] {
        use CallState::*;

        match self {
            AwaitingCall => &[CallStarted],
            CallStarted => &[AwaitingIntent],
            AwaitingIntent => &[ProcessingRequest],
            ProcessingRequest => &[GeneratingResponse],
            GeneratingResponse => &[SpeakingResponse],
            // Multi-turn calls loop back for the next intent
            SpeakingResponse => &[AwaitingIntent, CallEnded],
            CallEnded => &[AwaitingCall],
        }
    }

    /// Check if state transition is valid
    pub fn can_transition_to(&self, new_state: &CallState) -> bool {
        self.successors().contains(new_state)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::AwaitingCall => "AWAITING_CALL",
            CallState::CallStarted => "CALL_STARTED",
            CallState::AwaitingIntent => "AWAITING_INTENT",
            CallState::ProcessingRequest => "PROCESSING_REQUEST",
            CallState::GeneratingResponse => "GENERATING_RESPONSE",
            CallState::SpeakingResponse => "SPEAKING_RESPONSE",
            CallState::CallEnded => "CALL_ENDED",
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CallState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("unknown call state: {}", s))
    }
}
