/// Type alias for Result with anyhow::Error as the error type.
/// Typed errors from the domain seams convert into it through `?`.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
