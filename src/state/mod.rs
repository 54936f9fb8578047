pub mod pool;
pub mod position;
pub mod tick;

pub use pool::*;
pub use position::*;
pub use tick::*;
