pub mod local;
pub mod mem;

pub use local::LocalOption;
pub use mem::align_up;
