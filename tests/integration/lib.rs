//! Empty library target; the integration tests live in `tests/`.
