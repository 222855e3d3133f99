//! Property-name derivation for accessors.

use crate::model::MethodDecl;

/// True if `method` follows the getter convention: non-static, zero-argument,
/// non-void and named `getX...`, or `isX...` with a boolean-compatible return.
pub fn is_getter(method: &MethodDecl) -> bool {
    if method.is_static || method.params != 0 {
        return false;
    }
    let Some(returns) = &method.returns else {
        return false;
    };
    if has_prefix(&method.name, "get") {
        return true;
    }
    has_prefix(&method.name, "is") && returns.is_boolean_compatible()
}

/// Display name of an accessor property: the getter prefix stripped and the
/// remainder decapitalized, or the method name itself for non-getters.
pub fn accessor_property_name(method: &MethodDecl) -> String {
    let name = method.name.as_str();
    if has_prefix(name, "get") {
        return decapitalize(&name[3..]);
    }
    let boolean = method
        .returns
        .as_ref()
        .is_some_and(|kind| kind.is_boolean_compatible());
    if boolean && has_prefix(name, "is") {
        return decapitalize(&name[2..]);
    }
    name.to_string()
}

fn has_prefix(name: &str, prefix: &str) -> bool {
    name.len() > prefix.len() && name.starts_with(prefix)
}

/// Lower-cases the first character unless the first two are both upper case
/// (`URL` stays `URL`, `Name` becomes `name`).
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if let Some(second) = chars.clone().next() {
        if first.is_uppercase() && second.is_uppercase() {
            return name.to_string();
        }
    }
    first.to_lowercase().chain(chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PrimitiveKind, ValueKind};

    fn boolean() -> ValueKind {
        ValueKind::Primitive(PrimitiveKind::Boolean)
    }

    #[test]
    fn test_getter_convention() {
        assert!(is_getter(&MethodDecl::getter("getName", ValueKind::string())));
        assert!(is_getter(&MethodDecl::getter("isActive", boolean())));
        assert!(is_getter(&MethodDecl::getter("isActive", ValueKind::Object("Boolean".into()))));
        assert!(!is_getter(&MethodDecl::getter("isActive", ValueKind::string())));
        assert!(!is_getter(&MethodDecl::getter("get", ValueKind::string())));
        assert!(!is_getter(&MethodDecl::getter("name", ValueKind::string())));
        assert!(!is_getter(&MethodDecl::getter("getName", ValueKind::string()).params(1)));
        assert!(!is_getter(&MethodDecl::void("getName", 0)));
        assert!(!is_getter(&MethodDecl::getter("getName", ValueKind::string()).static_member()));
    }

    #[test]
    fn test_accessor_names() {
        let name = |m: MethodDecl| accessor_property_name(&m);
        assert_eq!(name(MethodDecl::getter("getName", ValueKind::string())), "name");
        assert_eq!(name(MethodDecl::getter("getURL", ValueKind::string())), "URL");
        assert_eq!(name(MethodDecl::getter("getX", ValueKind::string())), "x");
        assert_eq!(name(MethodDecl::getter("isActive", boolean())), "active");
        assert_eq!(name(MethodDecl::getter("isActive", ValueKind::string())), "isActive");
        assert_eq!(name(MethodDecl::getter("size", ValueKind::string())), "size");
    }

    #[test]
    fn test_decapitalize() {
        assert_eq!(decapitalize(""), "");
        assert_eq!(decapitalize("A"), "a");
        assert_eq!(decapitalize("FooBar"), "fooBar");
        assert_eq!(decapitalize("FOO"), "FOO");
        assert_eq!(decapitalize("foo"), "foo");
    }
}
