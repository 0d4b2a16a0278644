//! Set-once exchange status.

use http::StatusCode;

/// Status of one exchange: unset until the first status-affecting signal,
/// then fixed for the rest of the exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExchangeStatus {
    /// No signal yet.
    #[default]
    Unset,
    /// Fixed by the first signal.
    Set(StatusCode),
}

impl ExchangeStatus {
    /// Record `code` if no status has been set yet.
    ///
    /// Returns `true` if this call set the status.
    pub fn set_once(&mut self, code: StatusCode) -> bool {
        match self {
            Self::Unset => {
                *self = Self::Set(code);
                true
            }
            Self::Set(_) => false,
        }
    }

    /// Whether a status has been set.
    #[must_use]
    pub fn is_set(self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// The status, or `default` if none was set.
    #[must_use]
    pub fn resolve_or(self, default: StatusCode) -> StatusCode {
        match self {
            Self::Set(code) => code,
            Self::Unset => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_keep_first_status() {
        let mut status = ExchangeStatus::default();
        assert!(status.set_once(StatusCode::NOT_FOUND));
        assert!(!status.set_once(StatusCode::OK));
        assert_eq!(status, ExchangeStatus::Set(StatusCode::NOT_FOUND));
        assert_eq!(status.resolve_or(StatusCode::ACCEPTED), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_should_fall_back_when_unset() {
        let status = ExchangeStatus::Unset;
        assert!(!status.is_set());
        assert_eq!(status.resolve_or(StatusCode::ACCEPTED), StatusCode::ACCEPTED);
    }
}
