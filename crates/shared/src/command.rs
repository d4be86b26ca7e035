#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validate(String),

    #[error("{0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("not authenticated, please log in first")]
    Unauthenticated,

    #[error("permission denied")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Unknown(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Validation failures are detected before any I/O happens.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validate(_) | Error::Invalid(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        Self::Unknown(value.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Unknown(value.into())
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::Server(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Unknown(value.into())
    }
}

#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Server(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::Error::Server(format!($err)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Server(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! user {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Validate(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Validate(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! not_found {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::NotFound(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::NotFound(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_text(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            user!("text is required");
        }

        Ok(())
    }

    fn missing(id: &str) -> Result<()> {
        not_found!("task {id}");
    }

    #[test]
    fn test_user_macro_is_validation() {
        let err = empty_text("  ").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "text is required");
    }

    #[test]
    fn test_not_found_macro_message() {
        let err = missing("01J").unwrap_err();
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "task 01J not found");
    }
}
