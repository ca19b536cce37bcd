#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are both fine; panics are not.
    if let Ok(cfg) = tipctl_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        // A config that validates must map onto the core types without panicking.
        let _: tipctl_core::ControlCfg = (&cfg.control).into();
        let _: tipctl_core::SafetyCfg = (&cfg.safety).into();
        let _: tipctl_core::PowerCfg = (&cfg.power).into();
    }
});
