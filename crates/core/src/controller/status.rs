use crate::host::Host;
use crate::runtime::{Dispatcher, RepeatHandle};
use std::time::Duration;

use super::Session;

pub const ANIMATION_INTERVAL: Duration = Duration::from_millis(300);

/// Spinner shown in the status line while the formatter runs
pub struct StatusAnimation {
    handle: RepeatHandle,
}

impl StatusAnimation {
    pub fn start<H: Host + 'static>(dispatcher: &Dispatcher<Session<H>>, message: &str) -> Self {
        let base = message.trim_end().to_string();
        let mut index = 0usize;
        let handle = dispatcher.repeat(ANIMATION_INTERVAL, move |session, _| {
            let frames = session.host.platform().spinner_frames();
            let frame = frames[index % frames.len()];
            session.host.set_status(&format!("{base} {frame}"));
            index = (index + 1) % frames.len();
        });
        Self { handle }
    }

    /// Cancel the animation and clear the status line
    pub fn stop<H: Host>(self, host: &mut H) {
        self.handle.cancel();
        host.set_status("");
    }
}
