//! Argument whitelisting.
//!
//! Shell execution is forbidden everywhere; the kernel only ever spawns with
//! an explicit argv, and every element of that argv must pass this check.

use skyline_core::errors::DriverError;

/// Characters allowed in a non-path argument.
fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ',' | '=' | ':' | '/' | '@' | '+')
}

/// Whether a single argument passes the whitelist
/// `^[A-Za-z0-9_\-.,=:/@+]*$`, with absolute paths exempt.
pub fn is_safe_argument(arg: &str) -> bool {
    if arg.starts_with('/') {
        // Absolute paths may contain spaces and other filename characters,
        // but never NUL or newlines.
        return !arg.contains('\0') && !arg.contains('\n');
    }
    arg.chars().all(is_safe_char)
}

/// Validate a full argv. The first offending argument fails the run.
pub fn validate_args(args: &[String]) -> Result<(), DriverError> {
    for arg in args {
        if !is_safe_argument(arg) {
            return Err(DriverError::UnsafeArgument {
                argument: arg.clone(),
            });
        }
    }
    Ok(())
}
