#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = stepper_config::load_toml(data) {
        if cfg.validate().is_ok() {
            let floor = cfg.bounds.min.saturating_sub(cfg.bounds.step);
            let initial = cfg.initial_value();
            assert!(initial >= floor && initial <= cfg.bounds.max);
        }
    }
});
