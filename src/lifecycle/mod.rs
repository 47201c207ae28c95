//! Process lifecycle: signal handling

mod signals;

pub use signals::{SignalAction, Signals};
