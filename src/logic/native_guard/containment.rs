//! Fault Containment
//!
//! Runs operations that may call into the native detection layer and decides
//! "crash vs. degrade": known native-boundary faults become the fallback value,
//! everything else propagates unchanged.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;
use thiserror::Error;

use super::fingerprint::{default_fingerprints, CrashFingerprints};

// ============================================================================
// ERRORS
// ============================================================================

/// Failure of a guarded operation
#[derive(Debug, Error)]
pub enum OperationError {
    /// Native library could not be loaded or a symbol could not be resolved
    #[error("native linkage failure: {0}")]
    Linkage(String),
    /// Platform security policy refused the call
    #[error("security policy failure: {0}")]
    SecurityPolicy(String),
    /// Runtime failure; contained only if its message carries a crash fingerprint
    #[error("runtime failure: {0}")]
    Runtime(String),
    /// Never contained
    #[error("operation cancelled")]
    Cancelled,
    /// Application error, never contained
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OperationError {
    pub fn kind(&self) -> &'static str {
        match self {
            OperationError::Linkage(_) => "linkage",
            OperationError::SecurityPolicy(_) => "security_policy",
            OperationError::Runtime(_) => "runtime",
            OperationError::Cancelled => "cancelled",
            OperationError::Other(_) => "other",
        }
    }
}

// ============================================================================
// NATIVE GUARD
// ============================================================================

static DEFAULT_GUARD: Lazy<NativeGuard> =
    Lazy::new(|| NativeGuard::new(default_fingerprints().clone()));

/// Stateless executor for risky operations
#[derive(Debug, Clone)]
pub struct NativeGuard {
    fingerprints: CrashFingerprints,
}

impl Default for NativeGuard {
    fn default() -> Self {
        DEFAULT_GUARD.clone()
    }
}

impl NativeGuard {
    pub fn new(fingerprints: CrashFingerprints) -> Self {
        Self { fingerprints }
    }

    pub fn fingerprints(&self) -> &CrashFingerprints {
        &self.fingerprints
    }

    /// Run `computation`; contained faults yield `Ok(None)`
    pub fn run<T, F>(&self, operation: &str, computation: F) -> Result<Option<T>, OperationError>
    where
        F: FnOnce() -> Result<T, OperationError>,
    {
        self.run_or(operation, || computation().map(Some), || None)
    }

    /// Run `computation`; contained faults yield `fallback()`
    ///
    /// Panics whose message carries a crash fingerprint are contained too.
    /// Any other panic is resumed with its original payload.
    pub fn run_or<T, F, G>(&self, operation: &str, computation: F, fallback: G) -> Result<T, OperationError>
    where
        F: FnOnce() -> Result<T, OperationError>,
        G: FnOnce() -> T,
    {
        match panic::catch_unwind(AssertUnwindSafe(computation)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                if self.is_contained(&err) {
                    log::error!(
                        "[{}] Native-boundary fault contained ({}): {} - using fallback",
                        operation,
                        err.kind(),
                        err
                    );
                    Ok(fallback())
                } else {
                    Err(err)
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                match self.fingerprints.matched(&message) {
                    Some(fingerprint) => {
                        log::error!(
                            "[{}] Native crash contained (fingerprint '{}'): {} - using fallback",
                            operation,
                            fingerprint,
                            message
                        );
                        Ok(fallback())
                    }
                    None => panic::resume_unwind(payload),
                }
            }
        }
    }

    /// Whether `err` is a native-boundary fault this guard absorbs
    pub fn is_contained(&self, err: &OperationError) -> bool {
        match err {
            OperationError::Linkage(_) | OperationError::SecurityPolicy(_) => true,
            OperationError::Runtime(message) => self.fingerprints.matches(message),
            OperationError::Cancelled | OperationError::Other(_) => false,
        }
    }
}

/// Run with the default fingerprints; contained faults yield `Ok(None)`
pub fn run_guarded<T, F>(operation: &str, computation: F) -> Result<Option<T>, OperationError>
where
    F: FnOnce() -> Result<T, OperationError>,
{
    DEFAULT_GUARD.run(operation, computation)
}

/// Run with the default fingerprints; contained faults yield `fallback()`
pub fn run_guarded_or<T, F, G>(operation: &str, computation: F, fallback: G) -> Result<T, OperationError>
where
    F: FnOnce() -> Result<T, OperationError>,
    G: FnOnce() -> T,
{
    DEFAULT_GUARD.run_or(operation, computation, fallback)
}

/// Text of a panic payload (`&str` or `String`), empty otherwise
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::new()
    }
}

// ============================================================================
// PARAMETER VALIDATION
// ============================================================================

/// Non-empty check for values about to cross the native boundary
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for str {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for [u8] {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for Vec<u8> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Presence + ?Sized> Presence for &T {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }
}

impl<T: Presence> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().map_or(false, |v| v.is_present())
    }
}

/// False if any named parameter is absent, an empty string, or an empty blob
pub fn validate_parameters(operation: &str, params: &[(&str, &dyn Presence)]) -> bool {
    match params.iter().find(|(_, value)| !value.is_present()) {
        Some((name, _)) => {
            log::warn!("[{}] Parameter '{}' missing or empty - skipping native call", operation, name);
            false
        }
        None => true,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_passes_through() {
        let result = run_guarded_or("ok", || Ok(7), || -1).unwrap();
        assert_eq!(result, 7);
        assert_eq!(run_guarded("ok", || Ok("value")).unwrap(), Some("value"));
    }

    #[test]
    fn test_sigsegv_runtime_failure_returns_fallback() {
        let result = run_guarded_or(
            "attest",
            || Err(OperationError::Runtime("Fatal signal 11 (SIGSEGV) at 0x0".to_string())),
            || "fallback",
        );
        assert_eq!(result.unwrap(), "fallback");
    }

    #[test]
    fn test_contained_without_fallback_is_none() {
        let result: Result<Option<u32>, _> =
            run_guarded("load", || Err(OperationError::Linkage("libmtdcore.so not found".to_string())));
        assert_eq!(result.unwrap(), None);

        let result: Result<Option<u32>, _> =
            run_guarded("read", || Err(OperationError::SecurityPolicy("denied".to_string())));
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_unrelated_runtime_failure_propagates() {
        let result = run_guarded_or(
            "attest",
            || Err::<u32, _>(OperationError::Runtime("connection reset".to_string())),
            || 0,
        );
        assert!(matches!(result, Err(OperationError::Runtime(m)) if m == "connection reset"));
    }

    #[test]
    fn test_illegal_state_propagates_unchanged() {
        let result = run_guarded_or(
            "attest",
            || Err::<u32, _>(anyhow::anyhow!("illegal state: session not started").into()),
            || 0,
        );
        match result {
            Err(OperationError::Other(e)) => assert_eq!(e.to_string(), "illegal state: session not started"),
            other => panic!("expected propagated error, got {:?}", other),
        }
    }

    #[test]
    fn test_cancellation_is_never_contained() {
        let guard = NativeGuard::default();
        let result = guard.run_or("attest", || Err::<u32, _>(OperationError::Cancelled), || 0);
        assert!(matches!(result, Err(OperationError::Cancelled)));
    }

    #[test]
    fn test_fingerprinted_panic_is_contained() {
        let result = run_guarded_or(
            "scan",
            || -> Result<u32, OperationError> { panic!("native crash in MtdNativeBridge.scan") },
            || 42,
        );
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_unrelated_panic_is_resumed() {
        let outcome = std::panic::catch_unwind(|| {
            run_guarded_or(
                "scan",
                || -> Result<u32, OperationError> { panic!("index out of bounds") },
                || 42,
            )
        });
        let payload = outcome.unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "index out of bounds");
    }

    #[test]
    fn test_custom_fingerprints() {
        let guard = NativeGuard::new(CrashFingerprints::new(["libvendor_x"]).unwrap());
        assert!(guard.is_contained(&OperationError::Runtime("crash in libvendor_x".to_string())));
        assert!(!guard.is_contained(&OperationError::Runtime("SIGSEGV".to_string())));
    }

    #[test]
    fn test_validate_parameters() {
        let nonce = "abc".to_string();
        let blob = vec![1u8, 2, 3];
        let empty_blob: Vec<u8> = Vec::new();
        let absent: Option<String> = None;

        assert!(validate_parameters("attest", &[("nonce", &nonce), ("payload", &blob)]));
        assert!(!validate_parameters("attest", &[("nonce", &nonce), ("payload", &empty_blob)]));
        assert!(!validate_parameters("attest", &[("nonce", &""), ("payload", &blob)]));
        assert!(!validate_parameters("attest", &[("token", &absent)]));
        assert!(validate_parameters("attest", &[("token", &Some("t".to_string()))]));
        assert!(validate_parameters("attest", &[]));
    }
}
