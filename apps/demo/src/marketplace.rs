//! The marketplace schema resolved by the demo.

use knobs::{FieldSpec, Options, OptionsAware, OptionsError, SchemaMap, Value};

/// A required, allow-listed `domain` folded onto `tokopedia.com`, and a `schema` that
/// defaults to `http` and pins `port` to 80 for plain HTTP.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Marketplace;

impl OptionsAware for Marketplace {
    fn options_map(&self) -> SchemaMap {
        SchemaMap::new()
            .field(
                "domain",
                FieldSpec::new()
                    .required(true)
                    .allow_value(["tokopedia.com", "bukalapak.com"])
                    .allow_type(["fotos"])
                    .normalize(|_, domain| match domain {
                        Some(Value::Str(host)) if host == "bukalapak.com" => {
                            Some("tokopedia.com".into())
                        },
                        other => other,
                    }),
            )
            .field(
                "schema",
                FieldSpec::new().with_default("http").allow_value(["http", "https"]).normalize(
                    |store, schema| {
                        if schema.as_ref().and_then(Value::as_str) == Some("http") {
                            store.append("port", 80).ok()?;
                        }
                        schema
                    },
                ),
            )
    }
}

/// Registers the `fotos` filter: a dotted host name.
pub(crate) fn register_filters(options: &mut Options) -> Result<(), OptionsError> {
    options.register_filter("Fotos", |value: &Value| {
        value.as_str().is_some_and(|host| host.contains('.') && !host.starts_with('.'))
    })
}

/// Reads a command-line value as JSON, falling back to a plain string.
pub(crate) fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|json| Value::try_from(json).ok())
        .unwrap_or_else(|| Value::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_read_as_json_first() {
        assert_eq!(parse_value("443"), Value::Int(443));
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("\"443\""), Value::from("443"));
        assert_eq!(parse_value("tokopedia.com"), Value::from("tokopedia.com"));
        assert_eq!(parse_value("null"), Value::from("null"));
    }

    #[test]
    fn test_fotos_filter_accepts_hosts_only() {
        let mut options = Options::with_options([("domain", "localhost")]).unwrap();
        register_filters(&mut options).unwrap();

        assert!(!options.valid_type("domain", "fotos").unwrap());
        options.append("domain", "bukalapak.com").unwrap();
        assert!(options.valid_type("domain", "FOTOS").unwrap());
    }

    #[test]
    fn test_plain_http_pins_port() {
        let mut options = Options::with_options([("domain", "bukalapak.com")]).unwrap();
        register_filters(&mut options).unwrap();

        let resolved = options.resolve_with(&Marketplace).unwrap();
        assert_eq!(resolved["domain"], Value::from("tokopedia.com"));
        assert_eq!(resolved["port"], Value::Int(80));
    }
}
