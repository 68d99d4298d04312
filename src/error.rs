//! Crate error types.
//!
//! Nothing in the simulation itself is fatal: numeric faults are recovered in
//! place and economic rejections are plain `bool`s. Errors only surface from
//! the edges (settings files, save stores) and from visual-effect callbacks,
//! which the collision pass logs and skips.

use thiserror::Error;

/// Errors raised by settings and persistence I/O.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying file system failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON could not be parsed or produced.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Save data was readable but describes an impossible game.
    #[error("invalid save data: {reason}")]
    InvalidSave {
        /// Human-readable reason (for logging).
        reason: String,
    },
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A visual or audio effect hook failed while a collision was being resolved.
///
/// Returned by [`crate::sim::collision::EffectSink`] implementations. The
/// collision pass logs it and carries on with the remaining resolutions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("effect '{effect}' failed: {message}")]
pub struct EffectError {
    /// Which effect failed (e.g. "explosion", "shield_flash").
    pub effect: &'static str,
    pub message: String,
}

impl EffectError {
    pub fn new(effect: &'static str, message: impl Into<String>) -> Self {
        Self {
            effect,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = Error::InvalidSave {
            reason: "wave 0".into(),
        };
        assert_eq!(e.to_string(), "invalid save data: wave 0");

        let fx = EffectError::new("explosion", "sprite pool exhausted");
        assert_eq!(fx.to_string(), "effect 'explosion' failed: sprite pool exhausted");
    }

    #[test]
    fn test_json_error_converts() {
        let bad: std::result::Result<u32, _> = serde_json::from_str("{nope");
        let err: Error = bad.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
