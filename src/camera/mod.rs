mod interface;
mod mock;
#[cfg(test)]
mod tests;

pub use interface::{FrameProvider, SnapshotCamera};
pub use mock::MockCamera;
