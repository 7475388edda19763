/// Settled result of a debounced call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceOutcome<T, E> {
    /// The window's execution succeeded.
    Resolved(T),
    /// The window's execution failed; the error is passed through untouched.
    Rejected(E),
    /// The scheduled execution was cancelled before it fired.
    Cancelled,
}

impl<T, E> DebounceOutcome<T, E> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Convert into a `Result`, or `None` when the call was cancelled.
    pub fn into_result(self) -> Option<Result<T, E>> {
        match self {
            Self::Resolved(value) => Some(Ok(value)),
            Self::Rejected(err) => Some(Err(err)),
            Self::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DebounceOutcome<U, E> {
        match self {
            Self::Resolved(value) => DebounceOutcome::Resolved(f(value)),
            Self::Rejected(err) => DebounceOutcome::Rejected(err),
            Self::Cancelled => DebounceOutcome::Cancelled,
        }
    }
}

impl<T, E> From<Result<T, E>> for DebounceOutcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Resolved(value),
            Err(err) => Self::Rejected(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result() {
        let ok: DebounceOutcome<u32, String> = Ok(2).into();
        assert_eq!(ok.into_result(), Some(Ok(2)));

        let cancelled: DebounceOutcome<u32, String> = DebounceOutcome::Cancelled;
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.into_result(), None);
    }

    #[test]
    fn test_map_keeps_errors() {
        let err: DebounceOutcome<u32, &str> = DebounceOutcome::Rejected("boom");
        assert_eq!(err.map(|v| v + 1), DebounceOutcome::Rejected("boom"));
    }
}
