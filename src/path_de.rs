use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserialize JSON with the document path of the failure in the message.
pub fn from_json_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(Error::Json(format!("at JSON path {path} → {}", err.into_inner())))
        }
    }
}

/// Deserialize YAML with the document path of the failure in the message.
pub fn from_yaml_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let de = serde_yaml::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(Error::Yaml(format!("at YAML path {path} → {}", err.into_inner())))
        }
    }
}
