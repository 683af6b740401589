pub(crate) mod snapshot {
    use serde::{de, Serialize};

    pub const SERIALIZATION_VERSION_V1: u8 = 1u8;

    pub(crate) fn serialize<T>(value: &T) -> Result<Vec<u8>, String>
    where
        T: ?Sized + Serialize,
    {
        let data = serde_json::to_vec_pretty(value).map_err(|err| err.to_string())?;

        let mut result = vec![SERIALIZATION_VERSION_V1];
        result.extend(data);

        Ok(result)
    }

    pub(crate) fn deserialize<'a, T>(bytes: &'a [u8]) -> Result<T, String>
    where
        T: de::Deserialize<'a>,
    {
        match bytes.split_first() {
            Some((&SERIALIZATION_VERSION_V1, data)) => {
                serde_json::from_slice(data).map_err(|err| err.to_string())
            }
            Some(_) => Err("Unsupported serialization version".to_string()),
            None => Err("Empty snapshot".to_string()),
        }
    }

}

pub(crate) mod query {
    use regex::Regex;
    use std::sync::OnceLock;

    fn whitespace() -> &'static Regex {
        static WHITESPACE: OnceLock<Regex> = OnceLock::new();
        WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
    }

    /// Trims the query and collapses inner whitespace runs. `None` when nothing is left.
    pub(crate) fn normalize(query: &str) -> Option<String> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(whitespace().replace_all(trimmed, " ").into_owned())
        }
    }

}
