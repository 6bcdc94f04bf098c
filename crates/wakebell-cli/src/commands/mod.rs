pub mod alarm;
pub mod config;
pub mod sleep;
pub mod stopwatch;
pub mod subscription;
pub mod weather;
