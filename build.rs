//! Build script for trackalloc.
//!
//! Emits feature-aware notes for users integrating the tracker.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DEBUG");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_PARKING_LOT");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DIAGNOSTICS");

    let debug_enabled = env::var("CARGO_FEATURE_DEBUG").is_ok();
    let parking_lot_enabled = env::var("CARGO_FEATURE_PARKING_LOT").is_ok();
    let diagnostics_enabled = env::var("CARGO_FEATURE_DIAGNOSTICS").is_ok();

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let is_release = profile == "release";

    if debug_enabled {
        emit_info("Debug features enabled");
        emit_note("Released payloads are poisoned with 0xCD");
        emit_note("Leak reports include allocation backtraces");

        if is_release {
            emit_warning("Debug features enabled in release build!");
            emit_note("Backtrace capture on every allocation is expensive.");
        }
    }

    if parking_lot_enabled {
        emit_info("Using parking_lot for mutexes (faster lock implementation)");
    }

    if is_release && !diagnostics_enabled {
        emit_note("Tip: enable 'diagnostics' to keep tracker output in release builds:");
        emit_note("  trackalloc = { version = \"0.3\", features = [\"diagnostics\"] }");
    }
}

fn emit_info(msg: &str) {
    println!("cargo:warning=[trackalloc] ℹ️  {}", msg);
}

fn emit_note(msg: &str) {
    println!("cargo:warning=[trackalloc]    {}", msg);
}

fn emit_warning(msg: &str) {
    println!("cargo:warning=[trackalloc] ⚠️  {}", msg);
}
