//! Conversions from a parsed [`crate::YamlValue`] into concrete config types.
//! The `config-yaml-derive` crate generates `FromYaml` impls for structs by
//! calling into these primitive impls field by field.

use crate::{YamlError, YamlValue};
use std::collections::HashMap;

pub trait FromYaml: Sized {
    fn from_yaml(value: &YamlValue<'_>) -> Result<Self, YamlError>;
}

impl FromYaml for String {
    fn from_yaml(value: &YamlValue<'_>) -> Result<Self, YamlError> {
        match value {
            YamlValue::Scalar(s) => Ok((*s).to_string()),
            other => Err(YamlError::Generic(format!(
                "expected a scalar string, found {other:?}"
            ))),
        }
    }
}

impl FromYaml for bool {
    fn from_yaml(value: &YamlValue<'_>) -> Result<Self, YamlError> {
        match value {
            YamlValue::Scalar(s) => match *s {
                "true" | "yes" | "on" => Ok(true),
                "false" | "no" | "off" => Ok(false),
                other => Err(YamlError::Generic(format!("not a boolean: {other}"))),
            },
            other => Err(YamlError::Generic(format!(
                "expected a scalar bool, found {other:?}"
            ))),
        }
    }
}

macro_rules! impl_from_yaml_num {
    ($($t:ty),*) => {
        $(
            impl FromYaml for $t {
                fn from_yaml(value: &YamlValue<'_>) -> Result<Self, YamlError> {
                    match value {
                        YamlValue::Scalar(s) => s.parse::<$t>().map_err(|e| {
                            YamlError::Generic(format!("invalid {}: {e}", stringify!($t)))
                        }),
                        other => Err(YamlError::Generic(format!(
                            "expected a scalar number, found {other:?}"
                        ))),
                    }
                }
            }
        )*
    };
}

impl_from_yaml_num!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

impl<T: FromYaml> FromYaml for Vec<T> {
    fn from_yaml(value: &YamlValue<'_>) -> Result<Self, YamlError> {
        match value {
            YamlValue::List(items) => items.iter().map(T::from_yaml).collect(),
            other => Err(YamlError::Generic(format!(
                "expected a list, found {other:?}"
            ))),
        }
    }
}

impl<T: FromYaml> FromYaml for Option<T> {
    fn from_yaml(value: &YamlValue<'_>) -> Result<Self, YamlError> {
        match value {
            YamlValue::Scalar(s) if s.is_empty() => Ok(None),
            other => T::from_yaml(other).map(Some),
        }
    }
}

impl<T: FromYaml> FromYaml for HashMap<String, T> {
    fn from_yaml(value: &YamlValue<'_>) -> Result<Self, YamlError> {
        match value {
            YamlValue::Map(m) => m
                .iter()
                .map(|(k, v)| Ok(((*k).to_string(), T::from_yaml(v)?)))
                .collect(),
            other => Err(YamlError::Generic(format!(
                "expected a map, found {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    #[test]
    fn parses_scalar_fields() {
        let mut p = Parser::new("workers: 4\nbind: 0.0.0.0\nverbose: true\n").unwrap();
        let v = p.parse().unwrap();
        assert_eq!(u32::from_yaml(v.get("workers").unwrap()).unwrap(), 4);
        assert_eq!(
            String::from_yaml(v.get("bind").unwrap()).unwrap(),
            "0.0.0.0"
        );
        assert!(bool::from_yaml(v.get("verbose").unwrap()).unwrap());
    }

    #[test]
    fn rejects_bad_number() {
        let mut p = Parser::new("workers: not-a-number\n").unwrap();
        let v = p.parse().unwrap();
        assert!(u32::from_yaml(v.get("workers").unwrap()).is_err());
    }
}
