use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::constants::COORDINATE_MAX_DECIMALS;

// Field name, OData comparison operator, numeric literal. Operators are the
// OData set: eq ne gt lt ge le.
static RE_COORDINATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Latitude|Longitude)\s+(eq|ne|gt|lt|ge|le)\s+(-?\d+(?:\.\d+)?)").unwrap()
});

static RE_LIST_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(ListPrice)\s+(eq|ne|gt|lt|ge|le)\s+(-?\d+(?:\.\d+)?)").unwrap()
});

/// Rewrites the numeric literals the upstream feed chokes on: coordinates get
/// at most six decimal places, list prices are rounded to whole dollars.
/// Field names and operators pass through untouched.
///
/// Fail-open: a filter that cannot be rewritten is forwarded as typed rather
/// than blocking the whole query.
pub fn normalize_filter(raw: &str) -> String {
    match try_normalize(raw) {
        Some(normalized) => normalized,
        None => {
            tracing::warn!(filter = raw, "filter normalization failed, forwarding as typed");
            raw.to_string()
        }
    }
}

/// Rewrites the `$filter` parameter (matched case-insensitively) of an OData
/// resource string of the form `<path>?<query>`. Other parameters and a
/// query-less path are preserved.
pub fn normalize_resource(resource: &str) -> String {
    let Some((path, query)) = resource.split_once('?') else {
        return resource.to_string();
    };

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if key.eq_ignore_ascii_case("$filter") {
            serializer.append_pair(&key, &normalize_filter(&value));
        } else {
            serializer.append_pair(&key, &value);
        }
    }

    format!("{}?{}", path, serializer.finish())
}

fn try_normalize(raw: &str) -> Option<String> {
    let mut failed = false;

    let coordinates = RE_COORDINATE.replace_all(raw, |caps: &Captures| {
        match caps[3].parse::<f64>() {
            Ok(value) => format!("{} {} {}", &caps[1], &caps[2], format_coordinate(value)),
            Err(_) => {
                failed = true;
                caps[0].to_string()
            }
        }
    });

    let prices = RE_LIST_PRICE.replace_all(&coordinates, |caps: &Captures| {
        match caps[3].parse::<f64>() {
            Ok(value) => format!("{} {} {}", &caps[1], &caps[2], value.round() as i64),
            Err(_) => {
                failed = true;
                caps[0].to_string()
            }
        }
    });

    if failed {
        None
    } else {
        Some(prices.into_owned())
    }
}

// Six decimal places, trailing zeros stripped: -76.668912340 -> -76.668912,
// 39.5 -> 39.5, -76.0 -> -76.
fn format_coordinate(value: f64) -> String {
    let mut text = format!("{:.*}", COORDINATE_MAX_DECIMALS, value);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_and_prices_are_rewritten() {
        let normalized = normalize_filter("Longitude eq -76.66891234 and ListPrice ge 450000.7");
        assert!(normalized.contains("Longitude eq -76.668912"), "{}", normalized);
        assert!(normalized.contains("ListPrice ge 451"), "{}", normalized);
    }

    #[test]
    fn latitude_trailing_zeros_are_stripped() {
        assert_eq!(
            normalize_filter("Latitude le 39.290000"),
            "Latitude le 39.29"
        );
        assert_eq!(normalize_filter("Latitude gt -76.000000"), "Latitude gt -76");
    }

    #[test]
    fn whole_dollar_prices_stay_whole() {
        assert_eq!(
            normalize_filter("ListPrice le 500000"),
            "ListPrice le 500000"
        );
    }

    #[test]
    fn unrelated_filters_pass_through_byte_for_byte() {
        let raw = "StandardStatus eq 'Active' and BedroomsTotal ge 3";
        assert_eq!(normalize_filter(raw), raw);
    }

    #[test]
    fn operators_and_field_names_are_preserved() {
        let normalized =
            normalize_filter("Latitude ge 39.123456789 and Longitude lt -76.987654321");
        assert_eq!(
            normalized,
            "Latitude ge 39.123457 and Longitude lt -76.987654"
        );
    }

    #[test]
    fn resource_rewrites_filter_parameter_case_insensitively() {
        let resource = "Property?%24FILTER=ListPrice+ge+450000.7&%24top=3";
        let normalized = normalize_resource(resource);
        assert!(normalized.starts_with("Property?"));
        assert!(normalized.contains("ListPrice+ge+451"), "{}", normalized);
        assert!(normalized.contains("top=3"), "{}", normalized);
    }

    #[test]
    fn resource_without_query_is_unchanged() {
        assert_eq!(normalize_resource("Property('X123')"), "Property('X123')");
    }
}
