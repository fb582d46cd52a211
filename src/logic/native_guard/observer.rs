//! Uncaught Fault Observer
//!
//! Process-wide panic hook that annotates faults carrying a native crash
//! fingerprint. It never suppresses a fault: the previously installed hook
//! always runs afterwards.

use std::backtrace::Backtrace;
use std::panic::{self, PanicHookInfo};

use once_cell::sync::OnceCell;

use super::containment::panic_message;
use super::fingerprint::{default_fingerprints, CrashFingerprints};

static INSTALLED: OnceCell<()> = OnceCell::new();

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

/// Install the observer once per process. Returns false if already installed.
pub fn install_fault_observer() -> bool {
    let mut installed_now = false;

    INSTALLED.get_or_init(|| {
        panic::set_hook(annotated_hook(panic::take_hook()));
        installed_now = true;
    });

    if installed_now {
        log::info!("Native fault observer installed");
    }
    installed_now
}

/// Hook that logs fingerprinted faults, then always runs `previous`
fn annotated_hook(previous: PanicHook) -> PanicHook {
    Box::new(move |info: &PanicHookInfo<'_>| {
        let message = panic_message(info.payload());
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let stack = Backtrace::force_capture().to_string();

        if let Some(note) = fault_annotation(default_fingerprints(), &message, &stack) {
            log::error!("{} (at {})", note, location);
        }

        previous(info);
    })
}

/// Annotation for a fault whose message or stack carries a fingerprint
pub fn fault_annotation(fingerprints: &CrashFingerprints, message: &str, stack: &str) -> Option<String> {
    if let Some(fp) = fingerprints.matched(message) {
        return Some(format!("Native crash fingerprint '{}' in fault message: {}", fp, message));
    }

    fingerprints.matched(stack).map(|fp| {
        let frame = stack
            .lines()
            .find(|line| fingerprints.matches(line))
            .map(str::trim)
            .unwrap_or_default();
        format!("Native crash fingerprint '{}' in fault stack [{}]: {}", fp, frame, message)
    })
}

// ============================================================================
// TESTS
// ============================================================================
