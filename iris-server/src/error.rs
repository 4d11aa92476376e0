//! Mapping from iris_core::Error to gRPC Status codes

use tonic::Status;

/// Convert an `iris_core::Error` into the most appropriate gRPC `Status`
/// code.
///
/// Every variant is matched explicitly so that adding a new variant to
/// `iris_core::Error` causes a compile error here (no catch-all `_`).
pub fn core_error_to_status(e: iris_core::Error) -> Status {
    match &e {
        // Not-found / conflict
        iris_core::Error::IndexNotFound(_) => Status::not_found(e.to_string()),
        iris_core::Error::IndexExists(_) => Status::already_exists(e.to_string()),

        // Infrastructure / transient — nothing was installed, retry is safe
        iris_core::Error::Install(_) => Status::unavailable(e.to_string()),
        iris_core::Error::Io(_) => Status::unavailable(e.to_string()),

        // Server-side errors — INTERNAL
        iris_core::Error::Serialization(_) => Status::internal(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let status = core_error_to_status(iris_core::Error::IndexNotFound("books".into()));
        assert_eq!(status.code(), tonic::Code::NotFound);

        let status = core_error_to_status(iris_core::Error::Install("disk full".into()));
        assert_eq!(status.code(), tonic::Code::Unavailable);

        let status = core_error_to_status(iris_core::Error::Serialization("bad json".into()));
        assert_eq!(status.code(), tonic::Code::Internal);
    }
}
