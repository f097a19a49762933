#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(steps) = stepper_config::parse_script_csv(data) {
        for pair in steps.windows(2) {
            assert!(pair[0].at_ms <= pair[1].at_ms);
        }
        for step in &steps {
            assert!(!step.action.needs_value() || step.value.is_some());
        }
    }
});
