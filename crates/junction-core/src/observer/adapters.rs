use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

use crate::observer::{ObserverError, ReleaseEvent, ReleaseObserver};

/// Observer backed by a plain closure.
///
/// The closure runs on the dispatcher task and must not block.
pub struct FnObserver<F> {
    name: &'static str,
    f: F,
}

impl<F> FnObserver<F>
where
    F: Fn(&ReleaseEvent) + Send + Sync + 'static,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> ReleaseObserver for FnObserver<F>
where
    F: Fn(&ReleaseEvent) + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_release(&self, event: &ReleaseEvent) -> Result<(), ObserverError> {
        (self.f)(event);
        Ok(())
    }
}

impl<F> fmt::Debug for FnObserver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnObserver").field("name", &self.name).finish()
    }
}

/// Observer that forwards every release into an unbounded channel.
///
/// Sending never blocks, so slow consumers cannot stall the dispatcher.
/// Once the receiver is dropped each release reports [`ObserverError::Closed`].
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<ReleaseEvent>,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<ReleaseEvent>) -> Self {
        Self { tx }
    }
}

impl ReleaseObserver for ChannelObserver {
    fn name(&self) -> &'static str {
        "channel"
    }

    fn on_release(&self, event: &ReleaseEvent) -> Result<(), ObserverError> {
        self.tx
            .send(event.clone())
            .map_err(|_| ObserverError::Closed)
    }
}
