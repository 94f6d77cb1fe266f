mod event_printer;
mod replay_writer;

use std::fmt;

use crate::model::*;

pub use event_printer::EventPrinter;
pub use replay_writer::ReplayWriter;

pub trait Listener: Send {
    fn notify_event(&mut self, _game: &GameData, _event: &Notification) {}
}

impl fmt::Debug for dyn Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener")
    }
}
