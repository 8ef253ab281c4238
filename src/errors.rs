//! The errors encountered in this crate.

use reqwest::StatusCode;

/// The server responded with a non-successful status code.
#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "Request to {} failed with {}", url, status)]
pub struct FailedRequest {
    pub status: StatusCode,
    pub url: String,
}

/// More than one run mode was requested on the command line.
#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "Only one run mode may be selected, got {:?}", modes)]
pub struct InvalidMode {
    pub modes: Vec<&'static str>,
}
