pub mod error;
pub mod metrics;
pub mod observer;
pub mod unit;

mod clock;
mod controller;
mod dispatch;
mod queue;

pub use controller::{Controller, ControllerBuilder};
pub use error::CoreError;
pub use metrics::{MetricsBackend, MetricsHandle, NoOpMetrics, ObserverFailure, noop_metrics};
pub use observer::{
    ChannelObserver, FnObserver, ObserverError, ObserverHandle, ReleaseEvent, ReleaseObserver,
};
pub use queue::{QueueDepth, QueueError};
pub use unit::{Unit, UnitId, UnitView};

pub mod prelude {
    pub use crate::controller::{Controller, ControllerBuilder};
    pub use crate::error::CoreError;
    pub use crate::observer::{ReleaseEvent, ReleaseObserver};
    pub use crate::unit::{UnitId, UnitView};
    pub use junction_model::{ClockMode, ControllerConfig, Phase, Priority};
}
