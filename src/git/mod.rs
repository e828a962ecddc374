pub mod log;

pub use log::GitLogProvider;
