pub mod cleanup;
pub mod sync;

pub use cleanup::*;
pub use sync::*;
