use tracing::debug;

/// Parses the ingredients argument.
///
/// A bracketed argument is tried as a JSON array of strings first; when that
/// fails the brackets and quotes are stripped and the rest is split on
/// commas. Anything else is split on commas directly. Entries are trimmed and
/// empty entries dropped. This never fails: names that themselves contain
/// commas or quotes are split or altered by the fallback.
pub fn parse_ingredients(raw: &str) -> Vec<String> {
    let raw = raw.trim();

    if raw.starts_with('[') && raw.ends_with(']') {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(items) => return clean(items),
            Err(e) => {
                debug!("Ingredients are not a JSON string array ({}), splitting instead", e);
                let stripped = raw
                    .trim_matches(|c| c == '[' || c == ']')
                    .replace(['\'', '"'], "");
                return split_csv(&stripped);
            }
        }
    }

    split_csv(raw)
}

fn split_csv(raw: &str) -> Vec<String> {
    clean(raw.split(',').map(str::to_string))
}

fn clean(items: impl IntoIterator<Item = String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
