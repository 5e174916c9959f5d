/// Return `OperationError::Invalid($reason)` from the enclosing function unless `$condition`
/// holds.
macro_rules! verify {
    ($condition:expr, $reason:expr $(,)?) => {
        if !$condition {
            return Err($crate::errors::OperationError::invalid($reason));
        }
    };
}
