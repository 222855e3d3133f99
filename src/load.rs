//! Loading type universes and instances from YAML or JSON documents.
//!
//! An instance document names its type and the values of its members:
//!
//! ```yaml
//! type: shop.Order
//! values:
//!   id: 7                # most specific field named `id`
//!   shop.Entity#id: 3    # the field `id` declared by `shop.Entity`
//!   getTotal(): 12.5     # the result of the accessor `getTotal`
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::model::{ElementKind, PrimitiveKind, RegistryError, TypeRef, TypeRegistry, Universe, ValueKind};
use crate::value::{Array, ArrayShape, Instance, InstanceError, Value};

/// LoadError reports a document that could not be read or converted.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error("unknown type {name}")]
    UnknownType { name: String },

    #[error("value of {member} cannot be read as {expected}: {reason}")]
    Conversion {
        member: String,
        expected: String,
        reason: String,
    },
}

impl LoadError {
    fn conversion(member: &str, expected: &ValueKind, reason: impl Into<String>) -> Self {
        LoadError::Conversion {
            member: member.to_string(),
            expected: expected.to_string(),
            reason: reason.into(),
        }
    }
}

/// Document syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }

    fn parse<T: for<'de> Deserialize<'de>>(self, text: &str) -> Result<T, LoadError> {
        Ok(match self {
            Format::Yaml => serde_yaml::from_str(text)?,
            Format::Json => serde_json::from_str(text)?,
        })
    }
}

/// InstanceDoc is the document form of one instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceDoc {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub values: BTreeMap<String, Json>,
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub fn parse_universe(text: &str, format: Format) -> Result<Universe, LoadError> {
    format.parse(text)
}

/// Reads a universe document and registers its types.
pub fn load_universe(registry: &TypeRegistry, path: &Path) -> Result<Vec<TypeRef>, LoadError> {
    let universe = parse_universe(&read(path)?, Format::from_path(path))?;
    let types = registry.load(universe)?;
    log::debug!("loaded {} types from {}", types.len(), path.display());
    Ok(types)
}

pub fn parse_instance(text: &str, format: Format) -> Result<InstanceDoc, LoadError> {
    format.parse(text)
}

/// Reads an instance document and builds the instance.
pub fn read_instance(registry: &TypeRegistry, path: &Path) -> Result<Value, LoadError> {
    let doc = parse_instance(&read(path)?, Format::from_path(path))?;
    instance(registry, &doc)
}

/// Builds the instance described by `doc`, converting each value against
/// the declared kind of its member.
pub fn instance(registry: &TypeRegistry, doc: &InstanceDoc) -> Result<Value, LoadError> {
    let ty = registry
        .get(&doc.type_name)
        .ok_or_else(|| LoadError::UnknownType {
            name: doc.type_name.clone(),
        })?;
    let mut builder = Instance::builder(&ty);
    for (key, json) in &doc.values {
        let member = MemberKey::parse(key);
        let (owner, kind) = member.resolve(&ty)?;
        let value = convert(registry, key, json, &kind)?;
        builder = if member.accessor {
            builder.returns_on(owner.name(), member.name, value)
        } else {
            builder.set_on(owner.name(), member.name, value)
        };
    }
    Ok(builder.build()?)
}

/// A `values` key: `[Owner#]name` for fields, `[Owner#]name()` for accessors.
struct MemberKey<'a> {
    owner: Option<&'a str>,
    name: &'a str,
    accessor: bool,
}

impl<'a> MemberKey<'a> {
    fn parse(key: &'a str) -> Self {
        let (owner, rest) = match key.split_once('#') {
            Some((owner, rest)) => (Some(owner), rest),
            None => (None, key),
        };
        match rest.strip_suffix("()") {
            Some(name) => MemberKey {
                owner,
                name,
                accessor: true,
            },
            None => MemberKey {
                owner,
                name: rest,
                accessor: false,
            },
        }
    }

    /// Finds the declaring type and declared kind of this member on `ty`.
    fn resolve(&self, ty: &TypeRef) -> Result<(TypeRef, ValueKind), LoadError> {
        let declared = |t: &TypeRef| -> Option<ValueKind> {
            if self.accessor {
                t.find_accessor(self.name).and_then(|m| m.returns.clone())
            } else {
                t.find_field(self.name).map(|f| f.kind.clone())
            }
        };
        let unknown = |type_name: &str| {
            LoadError::Instance(InstanceError::UnknownMember {
                type_name: type_name.to_string(),
                kind: if self.accessor { "accessor" } else { "field" },
                member: self.name.to_string(),
            })
        };

        let ancestry = ty.ancestry();
        match self.owner {
            Some(owner) => {
                let t = ancestry
                    .into_iter()
                    .find(|t| t.name() == owner)
                    .ok_or_else(|| InstanceError::NotAnAncestor {
                        type_name: ty.name().to_string(),
                        owner: owner.to_string(),
                    })?;
                let kind = declared(&t).ok_or_else(|| unknown(owner))?;
                Ok((t, kind))
            }
            None => ancestry
                .into_iter()
                .find_map(|t| declared(&t).map(|kind| (t, kind)))
                .ok_or_else(|| unknown(ty.name())),
        }
    }
}

/// Converts one document value to a runtime value of the declared `kind`.
fn convert(registry: &TypeRegistry, member: &str, json: &Json, kind: &ValueKind) -> Result<Value, LoadError> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    match kind {
        ValueKind::Primitive(p) => primitive(member, json, *p, kind),
        ValueKind::Array { element, depth } => {
            let Json::Array(items) = json else {
                return Err(LoadError::conversion(member, kind, "expected a list"));
            };
            array(registry, member, items, element.clone(), *depth)
        }
        ValueKind::Object(name) => {
            if let Some(p) = PrimitiveKind::unboxed(name) {
                return primitive(member, json, p, kind);
            }
            match json {
                Json::String(s) if name == "String" || name == "Object" => Ok(Value::String(s.clone())),
                Json::Object(map) if map.contains_key("type") => {
                    let doc: InstanceDoc = serde_json::from_value(json.clone())?;
                    instance(registry, &doc)
                }
                Json::Object(map) if map.contains_key("array") => typed_array(registry, member, map),
                _ if name == "Object" => Ok(infer(json)),
                _ => Err(LoadError::conversion(
                    member,
                    kind,
                    "expected a nested instance document",
                )),
            }
        }
    }
}

fn array(
    registry: &TypeRegistry,
    member: &str,
    items: &[Json],
    element: ElementKind,
    rank: usize,
) -> Result<Value, LoadError> {
    let shape = ArrayShape::new(element, rank);
    let component = ValueKind::Array {
        element: shape.element.clone(),
        depth: rank,
    }
    .component()
    .unwrap_or_else(ValueKind::object);
    let elements = items
        .iter()
        .map(|item| convert(registry, member, item, &component))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Array::new(shape, elements).into_value())
}

/// `{array: String, rank: 1, items: [...]}` gives an untyped member a
/// specific array shape.
fn typed_array(
    registry: &TypeRegistry,
    member: &str,
    map: &serde_json::Map<String, Json>,
) -> Result<Value, LoadError> {
    let element = map
        .get("array")
        .and_then(Json::as_str)
        .map(ElementKind::parse)
        .ok_or_else(|| LoadError::conversion(member, &ValueKind::object(), "array names no component"))?;
    let rank = map.get("rank").and_then(Json::as_u64).unwrap_or(1).max(1) as usize;
    let empty = Vec::new();
    let items = match map.get("items") {
        Some(Json::Array(items)) => items,
        Some(_) => {
            return Err(LoadError::conversion(member, &ValueKind::object(), "items must be a list"))
        }
        None => &empty,
    };
    array(registry, member, items, element, rank)
}

fn primitive(member: &str, json: &Json, p: PrimitiveKind, kind: &ValueKind) -> Result<Value, LoadError> {
    let mismatch = |reason: &str| LoadError::conversion(member, kind, reason);
    let integer = || json.as_i64().ok_or_else(|| mismatch("expected an integer"));
    let out_of_range = |_| mismatch("out of range");
    let value = match p {
        PrimitiveKind::Boolean => Value::Boolean(json.as_bool().ok_or_else(|| mismatch("expected a boolean"))?),
        PrimitiveKind::Byte => Value::Byte(i8::try_from(integer()?).map_err(out_of_range)?),
        PrimitiveKind::Short => Value::Short(i16::try_from(integer()?).map_err(out_of_range)?),
        PrimitiveKind::Int => Value::Int(i32::try_from(integer()?).map_err(out_of_range)?),
        PrimitiveKind::Long => Value::Long(integer()?),
        PrimitiveKind::Char => {
            let s = json.as_str().ok_or_else(|| mismatch("expected a one-character string"))?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => return Err(mismatch("expected a one-character string")),
            }
        }
        PrimitiveKind::Float => Value::Float(floating(json).ok_or_else(|| mismatch("expected a number"))? as f32),
        PrimitiveKind::Double => Value::Double(floating(json).ok_or_else(|| mismatch("expected a number"))?),
    };
    Ok(value)
}

fn floating(json: &Json) -> Option<f64> {
    match json {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

/// Natural runtime value of an untyped document value.
fn infer(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).map(Value::Int).unwrap_or(Value::Long(i)),
            None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Array::new(
            ArrayShape::new(ElementKind::object("Object"), 1),
            items.iter().map(infer).collect(),
        )
        .into_value(),
        Json::Object(_) => Value::String(json.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDecl, MethodDecl, TypeDecl};
    use pretty_assertions::assert_eq;

    const UNIVERSE: &str = r#"
types:
- name: shop.Order
  parent: shop.Entity
  autoProperty:
    autoDetect: fields
  fields:
  - name: id
    type:
      primitive: long
  - name: codes
    type:
      array:
        element:
          primitive: int
        depth: 1
  - name: extra
    type:
      object: Object
  - name: customer
    type:
      object: shop.Customer
  methods:
  - name: getTotal
    returns:
      primitive: double
- name: shop.Entity
  fields:
  - name: id
    type:
      primitive: long
- name: shop.Customer
  autoProperty: {}
  fields:
  - name: name
    type:
      object: String
"#;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry
            .load(parse_universe(UNIVERSE, Format::Yaml).unwrap())
            .unwrap();
        registry
    }

    #[test]
    fn test_parse_universe_in_any_order() {
        let registry = registry();
        assert_eq!(
            registry.type_names(),
            vec!["shop.Customer", "shop.Entity", "shop.Order"]
        );
        let order = registry.get("shop.Order").unwrap();
        assert_eq!(order.parent().unwrap().name(), "shop.Entity");
    }

    #[test]
    fn test_instance_document() {
        let registry = registry();
        let doc = parse_instance(
            r#"{
                "type": "shop.Order",
                "values": {
                    "id": 7,
                    "shop.Entity#id": 3,
                    "codes": [1, 2],
                    "extra": {"array": "String", "items": ["a"]},
                    "customer": {"type": "shop.Customer", "values": {"name": "ada"}},
                    "getTotal()": "NaN"
                }
            }"#,
            Format::Json,
        )
        .unwrap();
        let value = instance(&registry, &doc).unwrap();
        let object = value.as_object().unwrap();
        let order = registry.get("shop.Order").unwrap();
        let entity = registry.get("shop.Entity").unwrap();

        assert_eq!(object.field(order.id(), "id"), Value::Long(7));
        assert_eq!(object.field(entity.id(), "id"), Value::Long(3));
        assert_eq!(object.field(order.id(), "codes"), Value::ints(&[1, 2]));
        assert_eq!(object.field(order.id(), "extra"), Value::strings(&["a"]));
        assert!(object.invoke(&order, "getTotal").natural_eq(&Value::Double(f64::NAN)));
        let customer = object.field(order.id(), "customer");
        assert_eq!(customer.type_name(), "shop.Customer");
    }

    #[test]
    fn test_documents_with_nested_instances_are_equal() {
        let registry = std::sync::Arc::new(registry());
        let engine = crate::engine::Structural::builder()
            .registry(registry.clone())
            .build();
        let doc = r#"
type: shop.Order
values:
  id: 7
  customer:
    type: shop.Customer
    values:
      name: ann
"#;
        let read = || instance(&registry, &parse_instance(doc, Format::Yaml).unwrap()).unwrap();
        let (a, b) = (read(), read());

        assert!(engine.equals(&a, &b).unwrap());
        assert_eq!(engine.hash_code(&a).unwrap(), engine.hash_code(&b).unwrap());
        assert!(engine.diff(&a, &b).unwrap().is_empty());
        assert!(engine
            .to_string(&a)
            .unwrap()
            .contains("customer: {Customer{name: {ann}}}"));
    }

    #[test]
    fn test_conversion_errors() {
        let registry = registry();
        let build = |values: &str| {
            let doc = parse_instance(
                &format!("type: shop.Order\nvalues: {}", values),
                Format::Yaml,
            )
            .unwrap();
            instance(&registry, &doc)
        };
        assert!(matches!(build("{id: abc}"), Err(LoadError::Conversion { .. })));
        assert!(matches!(build("{codes: 3}"), Err(LoadError::Conversion { .. })));
        assert!(matches!(
            build("{nope: 1}"),
            Err(LoadError::Instance(InstanceError::UnknownMember { .. }))
        ));
        assert!(matches!(
            build("{\"other.Type#id\": 1}"),
            Err(LoadError::Instance(InstanceError::NotAnAncestor { .. }))
        ));
        assert!(matches!(
            instance(
                &registry,
                &InstanceDoc {
                    type_name: "shop.Missing".into(),
                    values: BTreeMap::new(),
                }
            ),
            Err(LoadError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_primitive_ranges() {
        let registry = TypeRegistry::new();
        let ty = registry
            .define(
                TypeDecl::class("r.Small")
                    .field(FieldDecl::new("b", ValueKind::Primitive(PrimitiveKind::Byte)))
                    .field(FieldDecl::new("c", ValueKind::Primitive(PrimitiveKind::Char)))
                    .field(FieldDecl::new("n", ValueKind::Object("Integer".into())))
                    .method(MethodDecl::getter("isOn", ValueKind::Primitive(PrimitiveKind::Boolean))),
            )
            .unwrap();
        let build = |values: &str| {
            let doc = parse_instance(&format!("type: r.Small\nvalues: {}", values), Format::Yaml).unwrap();
            instance(&registry, &doc)
        };

        let v = build("{b: 12, c: x, n: 5, isOn(): true}").unwrap();
        let object = v.as_object().unwrap();
        assert_eq!(object.field(ty.id(), "b"), Value::Byte(12));
        assert_eq!(object.field(ty.id(), "c"), Value::Char('x'));
        assert_eq!(object.field(ty.id(), "n"), Value::Int(5));
        assert_eq!(object.invoke(&ty, "isOn"), Value::Boolean(true));

        assert!(matches!(build("{b: 300}"), Err(LoadError::Conversion { .. })));
        assert!(matches!(build("{c: xy}"), Err(LoadError::Conversion { .. })));
    }

    #[test]
    fn test_infer_untyped_values() {
        assert_eq!(infer(&serde_json::json!(3)), Value::Int(3));
        assert_eq!(infer(&serde_json::json!(5_000_000_000i64)), Value::Long(5_000_000_000));
        assert_eq!(infer(&serde_json::json!(1.5)), Value::Double(1.5));
        assert_eq!(
            infer(&serde_json::json!(["a", 1])),
            Array::new(
                ArrayShape::new(ElementKind::object("Object"), 1),
                vec![Value::from("a"), Value::Int(1)]
            )
            .into_value()
        );
    }
}
