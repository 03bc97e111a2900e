use crate::ClassifiedError;

/// Result of one logical API call: exactly one of data or error.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(ClassifiedError),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    /// Converts into a `Result` so callers can use `?`.
    pub fn into_result(self) -> Result<T, ClassifiedError> {
        self.into()
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Success(data) => Outcome::Success(f(data)),
            Self::Failure(error) => Outcome::Failure(error),
        }
    }
}

impl<T> From<Outcome<T>> for Result<T, ClassifiedError> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Success(data) => Ok(data),
            Outcome::Failure(error) => Err(error),
        }
    }
}

impl<T> From<Result<T, ClassifiedError>> for Outcome<T> {
    fn from(result: Result<T, ClassifiedError>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(error) => Self::Failure(error),
        }
    }
}
