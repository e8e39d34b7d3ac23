pub mod api_types;
pub mod client;
#[cfg(test)]
pub mod fake;
pub mod status;
pub mod types;
