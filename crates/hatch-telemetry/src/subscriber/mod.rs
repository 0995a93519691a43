//! Subscribers shipped with hatch

pub mod collector;
pub mod recording;

pub use collector::CollectorSubscriber;
pub use recording::RecordingSubscriber;
