//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `gantt_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    // Why: keep a tiny CLI probe to validate core crate wiring independently
    // from the host application runtime.
    println!("gantt_core ping={}", gantt_core::ping());
    println!("gantt_core version={}", gantt_core::core_version());
}
