//! Racetrack Gen entry point
//!
//! Usage: `racetrack-gen [params.json]`
//!
//! Generates one track and prints its export JSON to stdout. Logging goes
//! to stderr and is controlled with `RUST_LOG`.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::process::ExitCode;

    use racetrack_gen::{TrackAssembler, TrackParams};

    env_logger::init();
    log::info!("Racetrack Gen starting...");

    let params = match std::env::args().nth(1) {
        Some(path) => match TrackParams::load(&path) {
            Ok(params) => params,
            Err(err) => {
                log::error!("Failed to load parameters from {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            log::info!("No parameter file given, using defaults");
            TrackParams::default()
        }
    };

    let mut assembler = TrackAssembler::new(params);
    match assembler.generate().and_then(|track| track.to_json()) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Track generation failed: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on wasm; nothing to run
}
