pub mod store;

pub use store::{BatchTxn, MonitorRead, MonitorStore};
