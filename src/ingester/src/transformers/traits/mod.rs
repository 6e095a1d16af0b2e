use common::types::DEFAULT_BRAND;
use common::types::TRAIT_BRAND_PREFIX;
use serde_json::Map;
use serde_json::Value;

pub mod identify;

/// Which shape brand nesting produces. Both live side by side in the
/// pipeline; deployments pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    /// `{brands: {<settings.brand>: <camelCased traits>}}`
    SettingsBrand,
    /// `{brand_<traits.brand>: <original traits>}`
    TraitBrand,
}

/// Recursively rewrite snake_case keys to camelCase, through nested maps and
/// arrays. Leaf values pass through unchanged. Applying it twice is a no-op.
pub fn snake_to_camel(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (snake_to_camel_key(&key), snake_to_camel(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(snake_to_camel).collect()),
        other => other,
    }
}

fn snake_to_camel_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        // only `_` followed by a lowercase letter folds away
        if ch == '_' && chars.peek().is_some_and(|next| next.is_ascii_lowercase()) {
            out.push(chars.next().unwrap().to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `pilatesAnytime` -> `Pilates Anytime`
pub fn camel_to_title_with_spaces(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    for ch in value.chars() {
        if ch.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(ch);
    }
    let mut chars = out.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => out,
    }
}

/// Nest traits under the configured brand shape and copy the root fields the
/// downstream consumer schema expects unnested.
pub fn normalize_traits(traits: Map<String, Value>, brand: &str, nesting: Nesting) -> Map<String, Value> {
    match nesting {
        Nesting::SettingsBrand => nest_under_settings_brand(traits, brand),
        Nesting::TraitBrand => nest_under_trait_brand(traits),
    }
}

/// A single `brand_…` key means the payload has already been normalized and
/// must pass through untouched.
pub fn already_brand_nested(traits: &Map<String, Value>) -> bool {
    traits.len() == 1
        && traits
            .keys()
            .next()
            .is_some_and(|key| key.starts_with(TRAIT_BRAND_PREFIX))
}

fn nest_under_settings_brand(traits: Map<String, Value>, brand: &str) -> Map<String, Value> {
    let camel = match snake_to_camel(Value::Object(traits)) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };

    let mut brands = Map::new();
    brands.insert(brand.to_string(), Value::Object(camel.clone()));
    let mut nested = Map::new();
    nested.insert("brands".to_string(), Value::Object(brands));
    promote_root_fields(&mut nested, &camel);
    nested
}

fn nest_under_trait_brand(traits: Map<String, Value>) -> Map<String, Value> {
    if already_brand_nested(&traits) {
        return traits;
    }

    let brand = traits
        .get("brand")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_BRAND)
        .to_string();
    let mut nested = Map::new();
    nested.insert(
        format!("{TRAIT_BRAND_PREFIX}{brand}"),
        Value::Object(traits.clone()),
    );
    promote_root_fields(&mut nested, &traits);
    nested
}

fn promote_root_fields(nested: &mut Map<String, Value>, inner: &Map<String, Value>) {
    if let Some(email) = non_empty(inner, "email").or_else(|| non_empty(inner, "username")) {
        nested.insert("email".to_string(), email.clone());
    }
    if let Some(first_name) = non_empty(inner, "firstName") {
        nested.insert("firstName".to_string(), first_name.clone());
    }
    if let Some(last_name) = non_empty(inner, "lastName") {
        nested.insert("lastName".to_string(), last_name.clone());
    }
}

fn non_empty<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use serde_json::Map;
    use serde_json::Value;

    use super::already_brand_nested;
    use super::camel_to_title_with_spaces;
    use super::normalize_traits;
    use super::snake_to_camel;
    use super::Nesting;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn converts_snake_keys_recursively() {
        let converted = snake_to_camel(json!({
            "plan_status": "active",
            "billing": {"next_invoice_at": "2024-01-01"},
            "past_plans": [{"plan_name": "basic"}, "legacy_tag"]
        }));
        assert_eq!(
            converted,
            json!({
                "planStatus": "active",
                "billing": {"nextInvoiceAt": "2024-01-01"},
                "pastPlans": [{"planName": "basic"}, "legacy_tag"]
            })
        );
    }

    #[test]
    fn camel_keys_are_stable() {
        let input = json!({"planStatus": "active", "brand_channelYoga": {"a": 1}});
        assert_eq!(snake_to_camel(snake_to_camel(input.clone())), snake_to_camel(input));
    }

    #[test]
    fn leaves_and_null_pass_through() {
        assert_eq!(snake_to_camel(json!(null)), json!(null));
        assert_eq!(snake_to_camel(json!("plan_status")), json!("plan_status"));
        assert_eq!(snake_to_camel(json!(42)), json!(42));
    }

    #[test]
    fn titles_camel_case_brands() {
        assert_eq!(camel_to_title_with_spaces("pilatesAnytime"), "Pilates Anytime");
        assert_eq!(camel_to_title_with_spaces("channelYoga"), "Channel Yoga");
    }

    #[test]
    fn nests_under_settings_brand() {
        let nested = normalize_traits(
            map(json!({"plan_status": "active", "email": "jane@example.com", "firstName": "Jane"})),
            "pilatesAnytime",
            Nesting::SettingsBrand,
        );
        assert_eq!(
            Value::Object(nested),
            json!({
                "brands": {
                    "pilatesAnytime": {
                        "planStatus": "active",
                        "email": "jane@example.com",
                        "firstName": "Jane"
                    }
                },
                "email": "jane@example.com",
                "firstName": "Jane"
            })
        );
    }

    #[test]
    fn username_backfills_missing_email() {
        let nested = normalize_traits(
            map(json!({"username": "jane"})),
            "pilatesAnytime",
            Nesting::SettingsBrand,
        );
        assert_eq!(nested["email"], "jane");
    }

    #[test]
    fn nests_under_trait_brand_key() {
        let nested = normalize_traits(
            map(json!({"plan_status": "active", "brand": "pilatesAnytime"})),
            "ignored",
            Nesting::TraitBrand,
        );
        assert_eq!(
            Value::Object(nested),
            json!({
                "brand_pilatesAnytime": {"plan_status": "active", "brand": "pilatesAnytime"}
            })
        );
    }

    #[test]
    fn trait_brand_defaults_when_absent() {
        let nested = normalize_traits(map(json!({"plan_status": "active"})), "ignored", Nesting::TraitBrand);
        assert!(nested.contains_key("brand_channelYoga"));
    }

    #[test]
    fn already_nested_traits_pass_through_untouched() {
        let input = map(json!({"brand_channelYoga": {"planStatus": "active"}}));
        assert!(already_brand_nested(&input));
        assert_eq!(
            normalize_traits(input.clone(), "ignored", Nesting::TraitBrand),
            input
        );
    }

    #[test]
    fn multiple_keys_are_not_considered_nested() {
        let input = map(json!({"brand_channelYoga": {"planStatus": "active"}, "email": "j@x.com"}));
        assert!(!already_brand_nested(&input));
    }
}
