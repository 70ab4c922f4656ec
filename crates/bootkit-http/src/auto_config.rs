use bootkit::autoconfig::{AutoConfiguration, AutoConfigurationScope};
use bootkit::{BootDeclaration, BootError, CoreError, HookError};

use crate::client::{HttpClient, HttpClientCustomizer};
use crate::json::JsonOptions;
use crate::logger::HttpLogger;
use crate::properties::ClientProperties;

/// Binds an [`HttpClient`] built from `http.client.*` unless one is already bound
///
/// A user-bound `reqwest::Client` becomes the transport and a bound
/// [`HttpClientCustomizer`] adjusts the generated one. [`JsonOptions`] and,
/// when `http.client.logging.enabled` is set, an [`HttpLogger`] are
/// contributed alongside and only when missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpAutoConfiguration;

impl AutoConfiguration for HttpAutoConfiguration {
    fn name(&self) -> &str {
        "http-client"
    }

    fn order(&self) -> i32 {
        100
    }

    fn configure(&self, scope: &mut AutoConfigurationScope<'_>) -> Result<(), HookError> {
        let properties: ClientProperties = scope.property_record_or_default()?;

        let json = JsonOptions::from_properties(&properties.content_negotiation.json);
        scope.on_missing::<JsonOptions>(|scope| {
            scope.instance(json);
        });

        if properties.logging.enabled {
            let level = properties.logging.level;
            scope.on_missing::<HttpLogger>(|scope| {
                scope.instance(HttpLogger::new(level));
            });
        }

        scope.on_missing::<HttpClient>(|scope| {
            scope.single(move |container| {
                let client = match container.try_resolve::<reqwest::Client>() {
                    Some(transport) => HttpClient::with_client(transport.as_ref().clone(), &properties),
                    None => {
                        let customizer = container.try_resolve::<HttpClientCustomizer>();
                        HttpClient::from_properties(&properties, customizer.as_deref())
                    }
                }
                .map_err(CoreError::initialization::<HttpClient>)?;

                let mut client = match container.try_resolve::<JsonOptions>() {
                    Some(json) => client.with_json(*json),
                    None => client,
                };
                if properties.logging.enabled {
                    if let Some(logger) = container.try_resolve::<HttpLogger>() {
                        client = client.with_logger(logger);
                    }
                }
                tracing::debug!(
                    "HTTP client ready (base url: {})",
                    client.base_url().map(|url| url.as_str()).unwrap_or("none")
                );
                Ok(client)
            });
        });

        Ok(())
    }
}

/// Initializer registering [`HttpAutoConfiguration`]
pub fn http_initializer(declaration: &mut BootDeclaration) -> Result<(), BootError> {
    declaration.auto_configuration(HttpAutoConfiguration);
    Ok(())
}
