pub mod digest;
pub mod window;

pub use digest::{Digest, Review};
pub use window::Window;
