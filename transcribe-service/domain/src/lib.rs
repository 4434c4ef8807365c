pub mod entity;
pub mod error;
pub mod port;
pub mod retry;
pub mod service;

pub use entity::*;
pub use error::*;
pub use port::*;
pub use retry::*;
pub use service::*;
