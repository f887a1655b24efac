use subtle::ConstantTimeEq;

/// Compare a caller-supplied secret with the expected one in constant time.
///
/// Length mismatch short-circuits; only the content comparison is constant-time.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();

    if provided.len() != expected.len() {
        return false;
    }

    provided.ct_eq(expected).into()
}
