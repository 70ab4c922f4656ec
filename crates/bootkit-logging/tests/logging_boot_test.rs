//! Integration tests for the logging initializer
//!
//! The global subscriber can only be installed once per process, so these
//! tests check the boot outcome rather than the installed subscriber.

use bootkit::{run_boot, BootPhase};
use bootkit_logging::{logging_initializer, LogFormat, LoggingPropertiesExt, Severity};
use serde_json::json;

#[test]
fn test_boot_with_logging_properties() {
    let container = run_boot(|boot| {
        boot.with(logging_initializer)?.properties(|props| {
            props
                .logging_level(Severity::Info)?
                .logging_format(LogFormat::Json)?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();

    assert_eq!(container.property("logging.level"), Some(json!("info")));
    assert_eq!(container.property("logging.format"), Some(json!("json")));
}

#[test]
fn test_unknown_severity_fails_configuring() {
    let error = run_boot(|boot| {
        boot.with(logging_initializer)?
            .properties_map([("logging.level", "chatty")])?;
        Ok(())
    })
    .unwrap_err();

    assert!(error.is_startup_failure());
    assert_eq!(error.failed_phase(), Some(BootPhase::Configuring));
}
