use bootkit::{AppPropertiesExt, Boot, BootPhase, LogLevel, PhaseHooks};
use bootkit_http::{http_initializer, HttpClient};
use bootkit_logging::{logging_initializer, LoggingPropertiesExt, Severity};
use bootkit_settings::{settings_initializer, ContainerSettingsExt};

/// Boots the logging, HTTP and settings adapters together
///
/// Any property can be overridden with `DEMO__...` environment variables,
/// e.g. `DEMO__HTTP__CLIENT__REQUEST__URL=https://example.com/` makes the
/// demo fetch that URL and `DEMO__SETTINGS__DESKTOP__PATH=/tmp/demo` keeps
/// the launch counter across runs.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut boot = Boot::new(|boot| {
        boot.with(logging_initializer)?
            .with(http_initializer)?
            .with(settings_initializer)?
            .extender(
                PhaseHooks::new("demo")
                    .on(BootPhase::Running, |_| {
                        tracing::info!("Demo is running");
                        Ok(())
                    })
                    .on(BootPhase::Stopped, |_| {
                        tracing::info!("Demo stopped");
                        Ok(())
                    }),
            )
            .properties(|props| {
                props.app_logger_level(LogLevel::Info)?;
                props.logging_level(Severity::Info)?;
                Ok(())
            })?
            .properties_env("DEMO")?;
        Ok(())
    })?;

    let container = boot.run()?;

    let launches = container.settings("demo")?;
    let count = launches.int_or("launches", 0) + 1;
    launches.put_int("launches", count)?;
    tracing::info!("Launch number {}", count);

    let client = container.resolve::<HttpClient>()?;
    match client.base_url() {
        Some(url) => {
            let response = client.get(url.as_str()).await?;
            tracing::info!("GET {} -> {}", url, response.status());
        }
        None => tracing::info!("No http.client.request.url configured, skipping request"),
    }

    boot.stop();
    Ok(())
}
