use knobs::prelude::*;

/// Marketplace consumer: a required, allow-listed `domain` folded onto one host, and a
/// `schema` defaulting to `http` that pins `port` to 80 when plain HTTP is used.
#[derive(Debug, Clone, Copy)]
pub struct Marketplace;

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
                FieldSpec::new().with_default("http").normalize(|store, schema| {
                    if schema.as_ref().and_then(Value::as_str) == Some("http") {
                        store.append("port", 80).ok()?;
                    }
                    schema
                }),
            )
    }
}

/// Options seeded like a marketplace deployment, with the `Fotos` filter registered.
///
/// # Panics
/// * If seeding or filter registration fails.
#[must_use]
pub fn marketplace_options(seed: &[(&str, Value)]) -> Options {
    let mut options = Options::with_options(seed.iter().cloned()).expect("seed options");
    options.register_filter("Fotos", |_: &Value| true).expect("register fotos filter");
    options
}
