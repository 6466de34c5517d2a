mod throttle;
#[cfg(test)]
mod tests;

pub use throttle::{CaptureReport, CaptureThrottle, PendingCapture};
