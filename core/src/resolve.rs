//! URL resolution and query encoding.

use serde_json::Value;
use url::form_urlencoded::Serializer;
use url::Url;

use crate::error::Error;
use crate::http::Params;

/// Parse a base URL and normalize it to end with exactly one `/`, so that
/// relative paths join below it instead of replacing its last segment.
pub fn normalize_base(base: &str) -> Result<Url, Error> {
    let invalid = |source| Error::InvalidBaseUrl {
        url: base.to_string(),
        source,
    };

    let mut url = Url::parse(base.trim()).map_err(invalid)?;
    if url.cannot_be_a_base() {
        return Err(invalid(url::ParseError::RelativeUrlWithCannotBeABaseBase));
    }

    let path = format!("{}/", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_fragment(None);
    Ok(url)
}

/// Resolve `path` plus the encoded `params` against `base`.
///
/// Standard reference resolution applies: `/x` replaces the base path,
/// `x` joins below it, and absolute or protocol-relative references
/// replace the authority.
pub fn resolve_url(base: &Url, path: &str, params: Option<&Params>) -> Result<Url, Error> {
    let query = params.map(encode_query).unwrap_or_default();

    let target = if query.is_empty() {
        path.to_string()
    } else if path.contains('?') {
        format!("{path}&{query}")
    } else {
        format!("{path}?{query}")
    };

    base.join(&target).map_err(|source| Error::InvalidPath {
        path: path.to_string(),
        source,
    })
}

/// Form-encode a parameter mapping.
///
/// Arrays of scalars repeat the key (`a=1&a=2`), nested objects use bracket
/// keys (`a[b]=1`), containers inside arrays use indexed brackets
/// (`a[0][b]=1`) and `null` encodes as an empty value.
pub fn encode_query(params: &Params) -> String {
    let mut serializer = Serializer::new(String::new());
    for (key, value) in params {
        append_value(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append_value(serializer: &mut Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {
            serializer.append_pair(key, "");
        }
        Value::Bool(flag) => {
            serializer.append_pair(key, if *flag { "true" } else { "false" });
        }
        Value::Number(number) => {
            serializer.append_pair(key, &number.to_string());
        }
        Value::String(text) => {
            serializer.append_pair(key, text);
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if item.is_array() || item.is_object() {
                    append_value(serializer, &format!("{key}[{index}]"), item);
                } else {
                    append_value(serializer, key, item);
                }
            }
        }
        Value::Object(fields) => {
            for (sub, item) in fields {
                append_value(serializer, &format!("{key}[{sub}]"), item);
            }
        }
    }
}
