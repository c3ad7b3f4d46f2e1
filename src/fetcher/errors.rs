use thiserror::Error;

/// Rejections raised while turning user input into a fetchable target.
///
/// The messages double as the human-facing 400 response bodies, so they are
/// written for end users rather than operators.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Invalid URL format.")]
    InvalidFormat,

    #[error("Only http(s) URLs are allowed.")]
    UnsupportedScheme,

    #[error("Private or local network targets are blocked.")]
    LocalTarget,

    #[error("Private or internal IP targets are blocked.")]
    PrivateIp,

    #[error("Hostname could not be resolved.")]
    Unresolvable,

    #[error("Resolved IP points to a private/internal range.")]
    PrivateResolution,
}
