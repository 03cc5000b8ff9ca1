pub mod read_pool;
pub mod store;

pub use read_pool::ReadPoolConfig;
pub use store::{StoreConfig, SynchronousMode};
