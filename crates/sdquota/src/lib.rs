pub mod accounting;
pub mod client;
pub mod common;

#[cfg(test)]
pub(crate) mod tests;

pub type Error = crate::common::error::SdQuotaError;
pub type Result<T> = std::result::Result<T, Error>;

// Reexports
pub use tally;

pub const SDQUOTA_VERSION: &str = {
    match option_env!("SDQUOTA_BUILD_VERSION") {
        Some(version) => version,
        None => const_format::concatcp!(env!("CARGO_PKG_VERSION"), "-dev"),
    }
};
