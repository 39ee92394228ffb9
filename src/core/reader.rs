//! Typed read access to published properties.

use crate::error::{ConfigError, Result};
use serde::de::DeserializeOwned;

/// Typed read interface shared by snapshots and the polling config.
///
/// Implementors only provide raw lookup; coercion into typed values is
/// delegated to [`config::Value`], which parses strings such as `"8080"` or
/// `"true"` on demand.
///
/// Accessors without a default fail with [`ConfigError::NotFound`] when the
/// key is absent. The `_or` variants return the default for absent keys but
/// still report values that cannot be coerced.
pub trait PropertyReader {
    /// Look up the raw value for a key.
    fn get_value(&self, key: &str) -> Option<config::Value>;

    /// All keys currently present, sorted.
    fn keys(&self) -> Vec<String>;

    /// Check whether no properties are present.
    fn is_empty(&self) -> bool;

    /// Check whether a key is present.
    fn contains_key(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// Read a value as a string.
    fn get_string(&self, key: &str) -> Result<String> {
        coerce(key, require(self, key)?.into_string())
    }

    /// Read a value as a string, falling back to `default` when absent.
    fn get_string_or(&self, key: &str, default: &str) -> Result<String> {
        match self.get_value(key) {
            Some(value) => coerce(key, value.into_string()),
            None => Ok(default.to_string()),
        }
    }

    /// Read a value as a 64-bit integer.
    fn get_i64(&self, key: &str) -> Result<i64> {
        coerce(key, require(self, key)?.into_int())
    }

    /// Read a value as a 64-bit integer, falling back to `default` when absent.
    fn get_i64_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.get_value(key) {
            Some(value) => coerce(key, value.into_int()),
            None => Ok(default),
        }
    }

    /// Read a value as a 32-bit integer.
    fn get_i32(&self, key: &str) -> Result<i32> {
        narrow(key, self.get_i64(key)?)
    }

    /// Read a value as a 32-bit integer, falling back to `default` when absent.
    fn get_i32_or(&self, key: &str, default: i32) -> Result<i32> {
        narrow(key, self.get_i64_or(key, i64::from(default))?)
    }

    /// Read a value as a float.
    fn get_f64(&self, key: &str) -> Result<f64> {
        coerce(key, require(self, key)?.into_float())
    }

    /// Read a value as a float, falling back to `default` when absent.
    fn get_f64_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.get_value(key) {
            Some(value) => coerce(key, value.into_float()),
            None => Ok(default),
        }
    }

    /// Read a value as a boolean.
    fn get_bool(&self, key: &str) -> Result<bool> {
        coerce(key, require(self, key)?.into_bool())
    }

    /// Read a value as a boolean, falling back to `default` when absent.
    fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get_value(key) {
            Some(value) => coerce(key, value.into_bool()),
            None => Ok(default),
        }
    }

    /// Deserialize a value into any `serde` type.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T>
    where
        Self: Sized,
    {
        coerce(key, require(self, key)?.try_deserialize::<T>())
    }

    /// Deserialize a value, falling back to `default` when absent.
    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T>
    where
        Self: Sized,
    {
        match self.get_value(key) {
            Some(value) => coerce(key, value.try_deserialize::<T>()),
            None => Ok(default),
        }
    }
}

fn require<R: PropertyReader + ?Sized>(reader: &R, key: &str) -> Result<config::Value> {
    reader
        .get_value(key)
        .ok_or_else(|| ConfigError::NotFound(key.to_string()))
}

fn coerce<T>(key: &str, result: std::result::Result<T, config::ConfigError>) -> Result<T> {
    result.map_err(|e| ConfigError::TypeMismatch {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn narrow(key: &str, value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|e| ConfigError::TypeMismatch {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Snapshot;
    use crate::sources::properties;

    fn snapshot(body: &str) -> Snapshot {
        Snapshot::new(properties::parse("test", body).unwrap(), 1)
    }

    #[test]
    fn test_get_string() {
        let snap = snapshot("a=a_value\n");
        assert_eq!(snap.get_string("a").unwrap(), "a_value");
        assert!(matches!(snap.get_string("missing"), Err(ConfigError::NotFound(key)) if key == "missing"));
    }

    #[test]
    fn test_defaults_only_apply_to_absent_keys() {
        let snap = snapshot("port=8080\nname=svc\n");
        assert_eq!(snap.get_string_or("missing", "fallback").unwrap(), "fallback");
        assert_eq!(snap.get_string_or("name", "fallback").unwrap(), "svc");
        assert_eq!(snap.get_i64_or("missing", 7).unwrap(), 7);
        assert_eq!(snap.get_i64_or("port", 7).unwrap(), 8080);
        assert!(snap.get_i64_or("name", 7).is_err());
    }

    #[test]
    fn test_numeric_coercion() {
        let snap = snapshot("port=8080\nratio=0.75\nhuge=9999999999\n");
        assert_eq!(snap.get_i64("port").unwrap(), 8080);
        assert_eq!(snap.get_i32("port").unwrap(), 8080);
        assert_eq!(snap.get_f64("ratio").unwrap(), 0.75);
        assert_eq!(snap.get_f64_or("missing", 1.5).unwrap(), 1.5);
        assert!(matches!(snap.get_i32("huge"), Err(ConfigError::TypeMismatch { .. })));
        assert_eq!(snap.get_i32_or("missing", -1).unwrap(), -1);
    }

    #[test]
    fn test_bool_coercion() {
        let snap = snapshot("enabled=true\ndisabled=false\nbogus=maybe\n");
        assert!(snap.get_bool("enabled").unwrap());
        assert!(!snap.get_bool("disabled").unwrap());
        assert!(snap.get_bool_or("missing", true).unwrap());
        assert!(matches!(snap.get_bool("bogus"), Err(ConfigError::TypeMismatch { .. })));
    }

    #[test]
    fn test_generic_get() {
        let snap = snapshot("port=8080\nname=svc\n");
        assert_eq!(snap.get::<u16>("port").unwrap(), 8080);
        assert_eq!(snap.get::<String>("name").unwrap(), "svc");
        assert_eq!(snap.get_or::<u16>("missing", 80).unwrap(), 80);
        assert!(matches!(snap.get::<u16>("missing"), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_keys_and_contains() {
        let snap = snapshot("b=2\na=1\n");
        assert_eq!(snap.keys(), vec!["a", "b"]);
        assert!(snap.contains_key("a"));
        assert!(!snap.contains_key("c"));
        assert!(!PropertyReader::is_empty(&snap));
    }
}
