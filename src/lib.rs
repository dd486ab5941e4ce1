pub mod utils;
pub mod gpu;
pub use utils::Handle;

pub use gpu::*;
