pub mod cmdline;
pub mod endpoint;
