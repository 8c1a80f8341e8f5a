use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(located)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(located)
}

fn located(err: serde_path_to_error::Error<serde_json::Error>) -> Error {
    let path = err.path().to_string();
    Error::InvalidInput(format!("at JSON path {path} → {}", err.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn errors_name_the_offending_path() {
        let err = from_str_with_path::<Options>(r#"{"strictTypes": "yes"}"#).unwrap_err();
        assert!(err.to_string().contains("strictTypes"), "{err}");
    }

    #[test]
    fn bytes_and_str_agree() {
        let src = r#"{"strictNull": false}"#;
        let a: Options = from_str_with_path(src).unwrap();
        let b: Options = from_slice_with_path(src.as_bytes()).unwrap();
        assert_eq!(a.strict_null, b.strict_null);
    }
}
