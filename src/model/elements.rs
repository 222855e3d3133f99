//! Declaration elements: the marker surface a type exposes to the resolver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::value::{Instance, Value};

/// TypeKind distinguishes class-like types (single inheritance chain) from
/// interface-like types (resolved as a single level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
}

/// Visibility of a member. Drives the override scope of accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

/// Primitive value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "char" => PrimitiveKind::Char,
            "short" => PrimitiveKind::Short,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            _ => return None,
        };
        Some(kind)
    }

    /// The primitive a boxed type name stands for, as `Integer` for `int`.
    pub fn unboxed(name: &str) -> Option<Self> {
        let kind = match name {
            "Boolean" => PrimitiveKind::Boolean,
            "Byte" => PrimitiveKind::Byte,
            "Character" => PrimitiveKind::Char,
            "Short" => PrimitiveKind::Short,
            "Integer" => PrimitiveKind::Int,
            "Long" => PrimitiveKind::Long,
            "Float" => PrimitiveKind::Float,
            "Double" => PrimitiveKind::Double,
            _ => return None,
        };
        Some(kind)
    }
}

/// ElementKind is the innermost component of an array type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Primitive(PrimitiveKind),
    /// A reference component, named by its type (`String`, `Object`, ...).
    Object(String),
}

impl ElementKind {
    pub fn object(name: impl Into<String>) -> Self {
        ElementKind::Object(name.into())
    }

    /// Parses a component name: a primitive name or a reference type name.
    pub fn parse(name: &str) -> Self {
        match PrimitiveKind::from_name(name) {
            Some(p) => ElementKind::Primitive(p),
            None => ElementKind::Object(name.to_string()),
        }
    }

    /// The declared kind of a single element.
    pub fn value_kind(&self) -> ValueKind {
        match self {
            ElementKind::Primitive(p) => ValueKind::Primitive(*p),
            ElementKind::Object(name) => ValueKind::Object(name.clone()),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Primitive(p) => f.write_str(p.name()),
            ElementKind::Object(name) => f.write_str(name),
        }
    }
}

/// ValueKind is the declared type classification of a member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Primitive(PrimitiveKind),
    Array { element: ElementKind, depth: usize },
    Object(String),
}

impl ValueKind {
    pub fn string() -> Self {
        ValueKind::Object("String".to_string())
    }

    pub fn object() -> Self {
        ValueKind::Object("Object".to_string())
    }

    pub fn array(element: ElementKind, depth: usize) -> Self {
        ValueKind::Array { element, depth }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ValueKind::Array { .. })
    }

    /// Returns the array depth, zero for non-array kinds.
    pub fn depth(&self) -> usize {
        match self {
            ValueKind::Array { depth, .. } => *depth,
            _ => 0,
        }
    }

    /// The declared kind of an array's immediate elements.
    pub fn component(&self) -> Option<ValueKind> {
        match self {
            ValueKind::Array { element, depth } if *depth > 1 => Some(ValueKind::Array {
                element: element.clone(),
                depth: depth - 1,
            }),
            ValueKind::Array { element, .. } => Some(element.value_kind()),
            _ => None,
        }
    }

    /// True for `boolean` and its boxed counterpart.
    pub fn is_boolean_compatible(&self) -> bool {
        match self {
            ValueKind::Primitive(PrimitiveKind::Boolean) => true,
            ValueKind::Object(name) => name == "Boolean",
            _ => false,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Primitive(p) => f.write_str(p.name()),
            ValueKind::Array { element, depth } => {
                write!(f, "{}", element)?;
                for _ in 0..*depth {
                    f.write_str("[]")?;
                }
                Ok(())
            }
            ValueKind::Object(name) => f.write_str(name),
        }
    }
}

/// Per-member policy carried by an explicit property marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberPolicy {
    /// Defer to the level's default policy (all roles when there is none).
    #[default]
    Default,
    All,
    HashCodeEquals,
    Equals,
    EqualsToString,
    ToString,
    None,
}

/// Type-level default policy, applied to members without their own policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultPolicy {
    #[default]
    All,
    HashCodeEquals,
    Equals,
    EqualsToString,
    ToString,
    None,
}

/// Which members a level picks up without an explicit marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoDetect {
    None,
    #[default]
    Fields,
    Methods,
}

/// AutoProperty is the type-level declaration of a default policy and an
/// auto-detection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AutoProperty {
    #[serde(default)]
    pub policy: DefaultPolicy,
    #[serde(default, rename = "autoDetect")]
    pub auto_detect: AutoDetect,
}

impl AutoProperty {
    pub fn new(policy: DefaultPolicy, auto_detect: AutoDetect) -> Self {
        AutoProperty {
            policy,
            auto_detect,
        }
    }

    pub fn fields() -> Self {
        AutoProperty::new(DefaultPolicy::All, AutoDetect::Fields)
    }

    pub fn methods() -> Self {
        AutoProperty::new(DefaultPolicy::All, AutoDetect::Methods)
    }

    /// Declares a default policy without auto-detecting any members.
    pub fn policy_only(policy: DefaultPolicy) -> Self {
        AutoProperty::new(policy, AutoDetect::None)
    }
}

/// Equality markers a type may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqualityMarker {
    /// This type redefines equality even if it adds no equality properties.
    OverridesEquals,
    /// Subtypes of this type are always compatible with it for equality.
    SubclassCannotOverrideEquals,
}

/// PropertyMarker is the explicit per-member marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMarker {
    #[serde(default)]
    pub policy: MemberPolicy,
    /// Display name replacing the one derived from the member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PropertyMarker {
    pub fn new(policy: MemberPolicy) -> Self {
        PropertyMarker { policy, name: None }
    }

    /// The explicit display name, if one is set and not empty.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Member-level flags shared by fields and accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberOptions {
    /// Compare, hash and format by plain value even if the value is an array.
    #[serde(default, rename = "skipArrayCheck")]
    pub skip_array_check: bool,
    /// Recurse into nested arrays when hashing and formatting.
    #[serde(default, rename = "deepArray")]
    pub deep_array: bool,
    /// Identifier of a property formatter registered with the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// FieldDecl declares a stored member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyMarker>,
    #[serde(flatten)]
    pub options: MemberOptions,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        FieldDecl {
            name: name.into(),
            kind,
            visibility: Visibility::Private,
            is_static: false,
            property: None,
            options: MemberOptions::default(),
        }
    }

    pub fn marked(mut self, policy: MemberPolicy) -> Self {
        self.property = Some(PropertyMarker::new(policy));
        self
    }

    /// Marks the member and displays it as `name`.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.property.get_or_insert_with(PropertyMarker::default).name = Some(name.into());
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn skip_array_check(mut self) -> Self {
        self.options.skip_array_check = true;
        self
    }

    pub fn deep_array(mut self) -> Self {
        self.options.deep_array = true;
        self
    }

    pub fn format(mut self, id: impl Into<String>) -> Self {
        self.options.format = Some(id.into());
        self
    }
}

/// A computed accessor body.
#[derive(Clone)]
pub struct Accessor(pub Arc<dyn Fn(&Instance) -> Value + Send + Sync>);

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Accessor(..)")
    }
}

impl PartialEq for Accessor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Accessor {}

/// MethodBody describes what a zero-argument method returns when invoked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MethodBody {
    /// Returns the instance slot stored for this method on the implementing type.
    #[default]
    Slot,
    /// Returns the named field, looked up from the implementing type upwards.
    Field { field: String },
    /// Declared without a body; invoking it yields null.
    Abstract,
    #[serde(skip)]
    Computed(Accessor),
}

/// MethodDecl declares a method. Only zero-argument, non-void methods can be
/// properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    /// Declared return kind, `None` for void.
    #[serde(default, rename = "returns", skip_serializing_if = "Option::is_none")]
    pub returns: Option<ValueKind>,
    #[serde(default)]
    pub params: usize,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyMarker>,
    #[serde(flatten)]
    pub options: MemberOptions,
    #[serde(default)]
    pub body: MethodBody,
}

impl MethodDecl {
    /// Creates a public zero-argument accessor returning `kind`.
    pub fn getter(name: impl Into<String>, kind: ValueKind) -> Self {
        MethodDecl {
            name: name.into(),
            returns: Some(kind),
            params: 0,
            visibility: Visibility::Public,
            is_static: false,
            property: None,
            options: MemberOptions::default(),
            body: MethodBody::Slot,
        }
    }

    /// Creates a public void method with the given arity.
    pub fn void(name: impl Into<String>, params: usize) -> Self {
        MethodDecl {
            returns: None,
            params,
            ..MethodDecl::getter(name, ValueKind::object())
        }
    }

    pub fn marked(mut self, policy: MemberPolicy) -> Self {
        self.property = Some(PropertyMarker::new(policy));
        self
    }

    /// Marks the member and displays it as `name`.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.property.get_or_insert_with(PropertyMarker::default).name = Some(name.into());
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn params(mut self, params: usize) -> Self {
        self.params = params;
        self
    }

    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn skip_array_check(mut self) -> Self {
        self.options.skip_array_check = true;
        self
    }

    pub fn deep_array(mut self) -> Self {
        self.options.deep_array = true;
        self
    }

    pub fn format(mut self, id: impl Into<String>) -> Self {
        self.options.format = Some(id.into());
        self
    }

    pub fn returning_field(mut self, field: impl Into<String>) -> Self {
        self.body = MethodBody::Field {
            field: field.into(),
        };
        self
    }

    pub fn computed(mut self, f: impl Fn(&Instance) -> Value + Send + Sync + 'static) -> Self {
        self.body = MethodBody::Computed(Accessor(Arc::new(f)));
        self
    }

    pub fn abstract_body(mut self) -> Self {
        self.body = MethodBody::Abstract;
        self
    }
}

/// TypeDecl declares one type of the universe.
///
/// Type names are qualified with their package using dots
/// (`billing.Invoice`); the package scopes package-private overrides.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,

    #[serde(default)]
    pub kind: TypeKind,

    /// Parent class for class-like types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Implemented (or, for interfaces, extended) interfaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDecl>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDecl>,

    #[serde(default, rename = "autoProperty", skip_serializing_if = "Option::is_none")]
    pub auto_property: Option<AutoProperty>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equality: Option<EqualityMarker>,

    /// Identifier of a whole-object formatter registered with the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Member names in source declaration order, fields and methods
    /// interleaved. Absent when no canonical representation is available.
    #[serde(default, rename = "declarationOrder", skip_serializing_if = "Option::is_none")]
    pub declaration_order: Option<Vec<String>>,
}

impl TypeDecl {
    pub fn class(name: impl Into<String>) -> Self {
        TypeDecl {
            name: name.into(),
            kind: TypeKind::Class,
            ..Default::default()
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        TypeDecl {
            name: name.into(),
            kind: TypeKind::Interface,
            ..Default::default()
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn auto_property(mut self, auto: AutoProperty) -> Self {
        self.auto_property = Some(auto);
        self
    }

    pub fn equality(mut self, marker: EqualityMarker) -> Self {
        self.equality = Some(marker);
        self
    }

    pub fn format(mut self, id: impl Into<String>) -> Self {
        self.format = Some(id.into());
        self
    }

    pub fn declaration_order<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declaration_order = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// Universe is a loadable list of type declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}
