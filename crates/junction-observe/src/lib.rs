mod logger;
pub use logger::*;

mod release;

#[cfg(feature = "release-log")]
pub use release::*;
