pub mod config;
pub mod logging;

pub mod cancel;
pub mod gateway;
pub mod metadata;
pub mod pool;
pub mod results;
pub mod source;
pub mod uploader;
