#![doc = include_str!("../README.md")]

mod error;
mod ser;

pub use error::{Error, Result};
pub use ser::{Serializer, to_node, to_string, to_string_with_config, to_value};

#[cfg(test)]
mod tests {
    use super::*;
    use nix_expr::{FormatConfig, Node, Value};
    use serde::Serialize;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Serialize)]
    struct TestStruct {
        name: String,
        age: u32,
        active: bool,
    }

    #[derive(Serialize)]
    enum TestEnum {
        Unit,
        Newtype(String),
        Tuple(i32, i32),
        Struct { x: f64, y: f64 },
    }

    #[test]
    fn test_serialize_basic_types() {
        assert_eq!(to_string(&true).unwrap(), "true");
        assert_eq!(to_string(&42i64).unwrap(), "42");
        assert_eq!(to_string(&i64::MIN).unwrap(), "(-9223372036854775807 - 1)");
        assert_eq!(to_string(&-42i8).unwrap(), "(-42)");
        assert_eq!(to_string(&42u64).unwrap(), "42");
        assert_eq!(to_string(&1.5f64).unwrap(), "1.5");
        assert_eq!(to_string(&0.5f32).unwrap(), "0.5");
        assert_eq!(to_string(&0.1f32).unwrap(), "0.1");
        assert_eq!(to_string(&-3.3f32).unwrap(), "(-3.3)");
        assert_eq!(to_string(&2.0f64).unwrap(), "2.0");
        assert_eq!(to_string(&'x').unwrap(), "\"x\"");
        assert_eq!(to_string("hello").unwrap(), "\"hello\"");
        assert_eq!(to_string(&Some(42)).unwrap(), "42");
        assert_eq!(to_string(&None::<i32>).unwrap(), "null");
        assert_eq!(to_string(&()).unwrap(), "null");
    }

    #[test]
    fn test_serialize_collections() {
        assert_eq!(to_string(&vec![1, 2, 3]).unwrap(), "[ 1 2 3 ]");
        assert_eq!(to_string(&(1, "hello", true)).unwrap(), "[ 1 \"hello\" true ]");
        assert_eq!(to_string(&Vec::<i32>::new()).unwrap(), "[]");
        assert_eq!(to_string(&HashMap::<String, i32>::new()).unwrap(), "{}");
    }

    #[test]
    fn test_serialize_struct_keeps_field_order() {
        let test = TestStruct {
            name: "Bob".to_string(),
            age: 30,
            active: true,
        };
        assert_eq!(
            to_string(&test).unwrap(),
            "{\n  name = \"Bob\";\n  age = 30;\n  active = true;\n}"
        );
    }

    #[test]
    fn test_serialize_enum_variants() {
        assert_eq!(to_string(&TestEnum::Unit).unwrap(), "\"Unit\"");
        assert_eq!(
            to_string(&TestEnum::Newtype("x".to_string())).unwrap(),
            "{\n  Newtype = \"x\";\n}"
        );
        assert_eq!(
            to_string(&TestEnum::Tuple(1, 2)).unwrap(),
            "{\n  Tuple = [ 1 2 ];\n}"
        );
        assert_eq!(
            to_string(&TestEnum::Struct { x: 1.0, y: -2.5 }).unwrap(),
            "{\n  Struct = {\n    x = 1.0;\n    y = (-2.5);\n  };\n}"
        );
    }

    #[test]
    fn test_serialize_map_keys() {
        let map = BTreeMap::from([(1, "one"), (2, "two")]);
        assert_eq!(
            to_string(&map).unwrap(),
            "{\n  \"1\" = \"one\";\n  \"2\" = \"two\";\n}"
        );

        let map = BTreeMap::from([(true, 1)]);
        assert_eq!(to_string(&map).unwrap(), "{\n  true = 1;\n}");

        let map = BTreeMap::from([('c', 1)]);
        assert_eq!(to_string(&map).unwrap(), "{\n  c = 1;\n}");
    }

    #[test]
    fn test_non_scalar_map_key_is_rejected() {
        let map = BTreeMap::from([(vec![1], "list")]);
        assert_eq!(
            to_value(&map),
            Err(Error::KeyMustBeAString { kind: "array" })
        );
    }

    #[test]
    fn test_serialize_bytes() {
        struct Bytes(&'static [u8]);

        impl Serialize for Bytes {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_bytes(self.0)
            }
        }

        assert_eq!(to_string(&Bytes(b"\x00\xff")).unwrap(), "[ 0 255 ]");
    }

    #[test]
    fn test_to_value() {
        let value = to_value(&vec![Some(1), None]).unwrap();
        assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Null]));
    }

    #[test]
    fn test_to_node() {
        assert_eq!(
            to_node(&vec!["a"]).unwrap(),
            Node::List(vec![Node::String("a".to_string())])
        );
    }

    #[test]
    fn test_conversion_errors_are_wrapped() {
        let error = to_string(&vec![f64::NAN]).unwrap_err();
        assert!(matches!(
            error,
            Error::Convert(nix_expr::Error::UnsupportedValue { ref path, .. }) if path == "[0]"
        ));
        assert_eq!(
            error.to_string(),
            "Unsupported value at [0]: float NaN has no Nix representation"
        );

        assert!(matches!(
            to_string(&u64::MAX),
            Err(Error::Convert(nix_expr::Error::UnsupportedValue { .. }))
        ));
    }

    #[test]
    fn test_to_string_with_config() {
        let test = TestStruct {
            name: "Bob".to_string(),
            age: 30,
            active: true,
        };
        let config = FormatConfig::new().with_tabs(true);
        assert_eq!(
            to_string_with_config(&test, &config).unwrap(),
            "{\n\tname = \"Bob\";\n\tage = 30;\n\tactive = true;\n}"
        );
    }
}
