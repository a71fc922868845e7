//! Conversions from library errors into [`tonic::Status`].

use crate::error::CallbackError;
use tonic::Status;

/// Convert an error into a [`tonic::Status`] with the closest matching code.
pub trait IntoTonicStatus {
    /// Convert the error into a [`tonic::Status`].
    fn into_tonic_status(self) -> Status;
}

impl IntoTonicStatus for CallbackError {
    fn into_tonic_status(self) -> Status {
        match self {
            Self::NotImplemented(message) => Status::unimplemented(message),
            Self::NotExist { key } => Status::not_found(format!("key not found: {key}")),
            Self::InvalidArgument(message) => Status::invalid_argument(message),
            Self::Internal(message) => Status::internal(message),
        }
    }
}

impl IntoTonicStatus for tokio::task::JoinError {
    fn into_tonic_status(self) -> Status {
        if self.is_panic() {
            Status::internal("callback panicked")
        } else {
            Status::internal("callback was cancelled")
        }
    }
}

/// Convert an error into a [`tonic::Status`]. Convenient for `map_err`.
#[inline]
pub(crate) fn into_tonic_status(err: impl IntoTonicStatus) -> Status {
    err.into_tonic_status()
}

/// Collapse every callback failure except `NotImplemented` into `Internal`.
///
/// Handlers use this at the service boundary: callers can distinguish an unsupported request
/// from a broken callback, but nothing else about the callback's internals leaks out.
pub(crate) fn callback_fault_to_status(err: CallbackError) -> Status {
    match err {
        CallbackError::NotImplemented(_) => err.into_tonic_status(),
        other => Status::internal(other.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tonic::Code;

    #[test]
    fn callback_errors_map_to_codes() {
        let cases = [
            (CallbackError::NotImplemented("x".into()), Code::Unimplemented),
            (CallbackError::NotExist { key: "k".into() }, Code::NotFound),
            (CallbackError::InvalidArgument("x".into()), Code::InvalidArgument),
            (CallbackError::Internal("x".into()), Code::Internal),
        ];
        for (err, code) in cases {
            assert_eq!(into_tonic_status(err).code(), code);
        }
    }

    #[test]
    fn only_not_implemented_survives_the_boundary() {
        let status = callback_fault_to_status(CallbackError::NotImplemented("nope".into()));
        assert_eq!(status.code(), Code::Unimplemented);

        let status = callback_fault_to_status(CallbackError::InvalidArgument("bad".into()));
        assert_eq!(status.code(), Code::Internal);

        let status = callback_fault_to_status(CallbackError::NotExist { key: "k".into() });
        assert_eq!(status.code(), Code::Internal);
    }
}
