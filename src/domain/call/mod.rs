//! Call bounded context - lifecycle of a voice banking call

pub mod entity;
pub mod state_machine;
pub mod value_object;

pub use entity::{keys, CallContext, MetadataValue, UNKNOWN_PHONE, UNKNOWN_USER};
pub use state_machine::CallStateMachine;
pub use value_object::CallState;
