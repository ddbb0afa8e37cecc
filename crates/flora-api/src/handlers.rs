//! Request handlers.

pub mod assistant;
pub mod crop;
pub mod disease;
pub mod health;

pub use assistant::*;
pub use crop::*;
pub use disease::*;
pub use health::*;
