pub mod alerting;
pub mod config;
pub mod github;
pub mod monitor;
pub mod summary;

#[cfg(test)]
mod testing;
