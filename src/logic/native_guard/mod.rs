//! Native Guard Module
//!
//! Single point where "crash vs. degrade" is decided for work that touches the
//! native detection layer.
//!
//! ## Structure
//! - `fingerprint`: Crash fingerprints (segfault signatures, vendor symbols)
//! - `containment`: Guarded execution + parameter validation
//! - `observer`: Process-wide fault observer (logging only)
//!
//! ## Usage
//! ```ignore
//! use crate::logic::native_guard::{run_guarded_or, validate_parameters};
//!
//! if validate_parameters("attest", &[("nonce", &nonce)]) {
//!     let verdict = run_guarded_or("attest", || sdk.attest(&nonce), || Verdict::Unknown)?;
//! }
//! ```

pub mod fingerprint;
pub mod containment;
pub mod observer;

pub use fingerprint::{
    CrashFingerprints,
    default_fingerprints,
    SEGFAULT_SIGNATURES,
    THIRD_PARTY_SYMBOLS,
};

pub use containment::{
    NativeGuard,
    OperationError,
    Presence,
    panic_message,
    run_guarded,
    run_guarded_or,
    validate_parameters,
};

pub use observer::{install_fault_observer, fault_annotation};
