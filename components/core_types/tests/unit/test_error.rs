//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError, JsResult, Strictness};

#[cfg(test)]
mod error_kind_tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::TypeError.to_string(), "TypeError");
        assert_eq!(ErrorKind::ReferenceError.to_string(), "ReferenceError");
        assert_eq!(ErrorKind::RangeError.to_string(), "RangeError");
        assert_eq!(ErrorKind::InternalError.to_string(), "InternalError");
    }

    #[test]
    fn test_error_kind_is_copy() {
        let kind = ErrorKind::TypeError;
        let copied = kind;
        assert_eq!(kind, copied);
    }
}

#[cfg(test)]
mod js_error_tests {
    use super::*;

    #[test]
    fn test_type_error_constructor() {
        let err = JsError::type_error("Cannot redefine property: x");
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert_eq!(err.message, "Cannot redefine property: x");
    }

    #[test]
    fn test_error_is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&JsError::range_error("out of range"));
    }

    #[test]
    fn test_question_mark_propagation() {
        fn inner() -> JsResult<bool> {
            Strictness::Strict.reject("setter missing")
        }
        fn outer() -> JsResult<u32> {
            inner()?;
            Ok(1)
        }
        let err = outer().unwrap_err();
        assert_eq!(err.to_string(), "TypeError: setter missing");
    }
}
