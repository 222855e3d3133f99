//! Scenario tests for schema resolution and equality compatibility.

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    use crate::model::*;
    use crate::schema::*;

    fn names(props: &[PropertyDescriptor]) -> Vec<String> {
        props.iter().map(|p| p.name().to_string()).collect()
    }

    fn owners(props: &[PropertyDescriptor]) -> Vec<String> {
        props
            .iter()
            .map(|p| p.declaring_type().name().to_string())
            .collect()
    }

    fn resolve(ty: &TypeRef) -> Result<TypeSchema, SchemaError> {
        SchemaResolver::new().resolve(ty)
    }

    fn resolve_arc(ty: &TypeRef) -> Result<Arc<TypeSchema>, SchemaError> {
        resolve(ty).map(Arc::new)
    }

    #[test]
    fn test_auto_fields_take_all_roles() {
        let registry = TypeRegistry::new();
        let ty = registry
            .define(
                TypeDecl::class("s.Point")
                    .auto_property(AutoProperty::fields())
                    .field(FieldDecl::new("x", ValueKind::Primitive(PrimitiveKind::Int)))
                    .field(FieldDecl::new("y", ValueKind::Primitive(PrimitiveKind::Int)))
                    .field(FieldDecl::new("ORIGIN", ValueKind::object()).static_member()),
            )
            .unwrap();
        let schema = resolve(&ty).unwrap();
        assert_eq!(names(schema.equality_properties()), vec!["x", "y"]);
        assert_eq!(names(schema.hash_properties()), vec!["x", "y"]);
        assert_eq!(names(schema.string_properties()), vec!["x", "y"]);
        assert!(schema.equality_root().is_same(&ty));
        assert!(!schema.is_sealed());
    }

    #[test]
    fn test_member_policies_split_roles() {
        let registry = TypeRegistry::new();
        let ty = registry
            .define(
                TypeDecl::class("s.Account")
                    .field(FieldDecl::new("id", ValueKind::string()).marked(MemberPolicy::HashCodeEquals))
                    .field(FieldDecl::new("owner", ValueKind::string()).marked(MemberPolicy::Default))
                    .field(FieldDecl::new("note", ValueKind::string()).marked(MemberPolicy::ToString))
                    .field(FieldDecl::new("cache", ValueKind::object()))
                    .field(FieldDecl::new("secret", ValueKind::string()).marked(MemberPolicy::None)),
            )
            .unwrap();
        let schema = resolve(&ty).unwrap();
        assert_eq!(names(schema.equality_properties()), vec!["id", "owner"]);
        assert_eq!(names(schema.hash_properties()), vec!["id", "owner"]);
        assert_eq!(names(schema.string_properties()), vec!["owner", "note"]);
    }

    #[test]
    fn test_level_default_policy_applies_to_auto_members() {
        let registry = TypeRegistry::new();
        let ty = registry
            .define(
                TypeDecl::class("s.Tag")
                    .auto_property(AutoProperty::new(DefaultPolicy::EqualsToString, AutoDetect::Fields))
                    .field(FieldDecl::new("label", ValueKind::string()))
                    .field(FieldDecl::new("weight", ValueKind::object()).marked(MemberPolicy::Default)),
            )
            .unwrap();
        let schema = resolve(&ty).unwrap();
        assert_eq!(names(schema.equality_properties()), vec!["label", "weight"]);
        assert!(schema.hash_properties().is_empty());
        assert_eq!(names(schema.string_properties()), vec!["label", "weight"]);
    }

    #[test]
    fn test_marked_static_members_are_rejected() {
        let registry = TypeRegistry::new();
        let field = registry
            .define(
                TypeDecl::class("s.F").field(
                    FieldDecl::new("COUNT", ValueKind::object())
                        .static_member()
                        .marked(MemberPolicy::Default),
                ),
            )
            .unwrap();
        assert_eq!(
            resolve(&field).unwrap_err(),
            SchemaError::static_member_marked("s.F", "COUNT")
        );

        let method = registry
            .define(
                TypeDecl::class("s.M").method(
                    MethodDecl::getter("getCount", ValueKind::object())
                        .static_member()
                        .marked(MemberPolicy::Default),
                ),
            )
            .unwrap();
        assert_eq!(
            resolve(&method).unwrap_err(),
            SchemaError::static_member_marked("s.M", "getCount")
        );
    }

    #[test]
    fn test_marked_non_accessors_are_rejected() {
        let registry = TypeRegistry::new();
        let with_args = registry
            .define(TypeDecl::class("s.A").method(
                MethodDecl::getter("getX", ValueKind::object())
                    .params(2)
                    .marked(MemberPolicy::All),
            ))
            .unwrap();
        assert!(matches!(
            resolve(&with_args),
            Err(SchemaError::NotAnAccessor { reason, .. }) if reason == "takes 2 arguments"
        ));

        let void = registry
            .define(TypeDecl::class("s.B").method(MethodDecl::void("reset", 0).marked(MemberPolicy::All)))
            .unwrap();
        assert!(matches!(
            resolve(&void),
            Err(SchemaError::NotAnAccessor { reason, .. }) if reason == "returns void"
        ));
    }

    #[test]
    fn test_auto_methods_follow_getter_convention() {
        let registry = TypeRegistry::new();
        let ty = registry
            .define(
                TypeDecl::class("s.Bean")
                    .auto_property(AutoProperty::methods())
                    .field(FieldDecl::new("ignored", ValueKind::object()))
                    .method(MethodDecl::getter("getName", ValueKind::string()))
                    .method(MethodDecl::getter("isActive", ValueKind::Primitive(PrimitiveKind::Boolean)))
                    .method(MethodDecl::getter("isLabel", ValueKind::string()))
                    .method(MethodDecl::getter("getURL", ValueKind::string()))
                    .method(MethodDecl::getter("size", ValueKind::Primitive(PrimitiveKind::Int)))
                    .method(MethodDecl::getter("getWith", ValueKind::string()).params(1))
                    .method(MethodDecl::getter("size2", ValueKind::object()).marked(MemberPolicy::Default)),
            )
            .unwrap();
        let schema = resolve(&ty).unwrap();
        assert_eq!(
            names(schema.equality_properties()),
            vec!["name", "active", "URL", "size2"]
        );
    }

    #[test]
    fn test_overridden_accessor_contributes_once() {
        let registry = TypeRegistry::new();
        registry
            .define(
                TypeDecl::class("s.Parent")
                    .auto_property(AutoProperty::methods())
                    .method(MethodDecl::getter("getX", ValueKind::object())),
            )
            .unwrap();
        let child = registry
            .define(
                TypeDecl::class("s.Child")
                    .extends("s.Parent")
                    .auto_property(AutoProperty::methods())
                    .method(MethodDecl::getter("getX", ValueKind::object()))
                    .method(MethodDecl::getter("getY", ValueKind::object())),
            )
            .unwrap();
        let schema = resolve(&child).unwrap();
        assert_eq!(names(schema.equality_properties()), vec!["x", "y"]);
        assert_eq!(owners(schema.equality_properties()), vec!["s.Parent", "s.Child"]);
        assert!(schema.equality_root().is_same(&child));
    }

    #[test]
    fn test_override_adds_missing_roles() {
        let registry = TypeRegistry::new();
        registry
            .define(TypeDecl::class("s.Base").method(
                MethodDecl::getter("getX", ValueKind::object()).marked(MemberPolicy::HashCodeEquals),
            ))
            .unwrap();
        let derived = registry
            .define(
                TypeDecl::class("s.Derived")
                    .extends("s.Base")
                    .method(MethodDecl::getter("getX", ValueKind::object()).marked(MemberPolicy::All)),
            )
            .unwrap();
        let schema = resolve(&derived).unwrap();
        assert_eq!(owners(schema.equality_properties()), vec!["s.Base"]);
        assert_eq!(owners(schema.hash_properties()), vec!["s.Base"]);
        assert_eq!(owners(schema.string_properties()), vec!["s.Derived"]);
        // only string was contributed at the derived level
        assert_eq!(schema.equality_root().name(), "s.Base");
    }

    #[test]
    fn test_private_accessors_are_distinct_properties() {
        let registry = TypeRegistry::new();
        registry
            .define(TypeDecl::class("s.Base").method(
                MethodDecl::getter("getX", ValueKind::object())
                    .visibility(Visibility::Private)
                    .marked(MemberPolicy::All),
            ))
            .unwrap();
        let derived = registry
            .define(TypeDecl::class("s.Derived").extends("s.Base").method(
                MethodDecl::getter("getX", ValueKind::object())
                    .visibility(Visibility::Private)
                    .marked(MemberPolicy::All),
            ))
            .unwrap();
        let schema = resolve(&derived).unwrap();
        assert_eq!(owners(schema.equality_properties()), vec!["s.Base", "s.Derived"]);
    }

    #[test]
    fn test_hash_requested_over_equals_only_parent_fails() {
        let registry = TypeRegistry::new();
        registry
            .define(TypeDecl::class("s.Base").method(
                MethodDecl::getter("getX", ValueKind::object()).marked(MemberPolicy::Equals),
            ))
            .unwrap();
        let derived = registry
            .define(TypeDecl::class("s.Derived").extends("s.Base").method(
                MethodDecl::getter("getX", ValueKind::object()).marked(MemberPolicy::HashCodeEquals),
            ))
            .unwrap();
        let err = resolve(&derived).unwrap_err();
        assert_eq!(err, SchemaError::hash_without_equals("s.Derived", "getX"));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_shadowed_fields_are_both_kept() {
        let registry = TypeRegistry::new();
        registry
            .define(
                TypeDecl::class("s.Base")
                    .auto_property(AutoProperty::fields())
                    .field(FieldDecl::new("x", ValueKind::object())),
            )
            .unwrap();
        let derived = registry
            .define(
                TypeDecl::class("s.Derived")
                    .extends("s.Base")
                    .auto_property(AutoProperty::fields())
                    .field(FieldDecl::new("x", ValueKind::object())),
            )
            .unwrap();
        let schema = resolve(&derived).unwrap();
        assert_eq!(names(schema.equality_properties()), vec!["x", "x"]);
        assert_eq!(owners(schema.equality_properties()), vec!["s.Base", "s.Derived"]);
    }

    #[test]
    fn test_no_eligible_properties() {
        let registry = TypeRegistry::new();
        let ty = registry
            .define(TypeDecl::class("s.Opaque").field(FieldDecl::new("x", ValueKind::object())))
            .unwrap();
        assert_eq!(
            resolve(&ty).unwrap_err(),
            SchemaError::no_eligible_properties("s.Opaque")
        );
    }

    #[test]
    fn test_interface_is_single_sealed_level() {
        let registry = TypeRegistry::new();
        registry
            .define(TypeDecl::interface("s.Base").method(
                MethodDecl::getter("getA", ValueKind::object()).marked(MemberPolicy::All),
            ))
            .unwrap();
        let named = registry
            .define(
                TypeDecl::interface("s.Named")
                    .implements("s.Base")
                    .method(MethodDecl::getter("getName", ValueKind::string()).marked(MemberPolicy::All)),
            )
            .unwrap();
        let schema = resolve(&named).unwrap();
        assert_eq!(names(schema.equality_properties()), vec!["name"]);
        assert!(schema.is_sealed());
        assert!(schema.equality_root().is_same(&named));
    }

    #[test]
    fn test_equality_markers() {
        let registry = TypeRegistry::new();
        registry
            .define(
                TypeDecl::class("s.Shape")
                    .auto_property(AutoProperty::fields())
                    .field(FieldDecl::new("id", ValueKind::object())),
            )
            .unwrap();
        let redefined = registry
            .define(
                TypeDecl::class("s.Circle")
                    .extends("s.Shape")
                    .equality(EqualityMarker::OverridesEquals),
            )
            .unwrap();
        let schema = resolve(&redefined).unwrap();
        assert!(schema.equality_root().is_same(&redefined));
        assert!(!schema.is_sealed());

        let sealed = registry
            .define(
                TypeDecl::class("s.Square")
                    .extends("s.Shape")
                    .equality(EqualityMarker::SubclassCannotOverrideEquals),
            )
            .unwrap();
        let schema = resolve(&sealed).unwrap();
        assert!(schema.equality_root().is_same(&sealed));
        assert!(schema.is_sealed());
    }

    #[test]
    fn test_declaration_order_reconciliation() {
        let registry = TypeRegistry::new();
        let decl = TypeDecl::class("s.Mixed")
            .auto_property(AutoProperty::policy_only(DefaultPolicy::All))
            .field(FieldDecl::new("b", ValueKind::object()).marked(MemberPolicy::Default))
            .field(FieldDecl::new("d", ValueKind::object()).marked(MemberPolicy::Default))
            .method(MethodDecl::getter("getA", ValueKind::object()).marked(MemberPolicy::Default))
            .method(MethodDecl::getter("getC", ValueKind::object()).marked(MemberPolicy::Default));

        let unordered = registry.define(decl.clone()).unwrap();
        assert_eq!(
            names(resolve(&unordered).unwrap().equality_properties()),
            vec!["b", "d", "a", "c"]
        );

        let ordered = registry
            .define(
                TypeDecl {
                    name: "s.Ordered".into(),
                    ..decl.clone()
                }
                .declaration_order(["getA", "b", "getC", "ignoredHelper", "d"]),
            )
            .unwrap();
        assert_eq!(
            names(resolve(&ordered).unwrap().equality_properties()),
            vec!["a", "b", "c", "d"]
        );
        assert_eq!(
            names(
                SchemaResolver::new()
                    .reconcile_declaration_order(false)
                    .resolve(&ordered)
                    .unwrap()
                    .equality_properties()
            ),
            vec!["b", "d", "a", "c"]
        );

        let broken = registry
            .define(
                TypeDecl {
                    name: "s.Broken".into(),
                    ..decl
                }
                .declaration_order(["getA", "b"]),
            )
            .unwrap();
        let err = resolve(&broken).unwrap_err();
        assert!(matches!(err, SchemaError::DeclarationOrderMismatch { .. }));
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_declaration_order_keeps_levels_apart() {
        let registry = TypeRegistry::new();
        registry
            .define(
                TypeDecl::class("s.Top")
                    .auto_property(AutoProperty::fields())
                    .field(FieldDecl::new("z", ValueKind::object()))
                    .declaration_order(["z"]),
            )
            .unwrap();
        let bottom = registry
            .define(
                TypeDecl::class("s.Bottom")
                    .extends("s.Top")
                    .auto_property(AutoProperty::fields())
                    .field(FieldDecl::new("b", ValueKind::object()))
                    .field(FieldDecl::new("a", ValueKind::object()))
                    .declaration_order(["a", "b"]),
            )
            .unwrap();
        assert_eq!(
            names(resolve(&bottom).unwrap().equality_properties()),
            vec!["z", "a", "b"]
        );
    }

    fn family() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry
            .define(
                TypeDecl::class("f.Parent")
                    .auto_property(AutoProperty::fields())
                    .field(FieldDecl::new("x", ValueKind::object())),
            )
            .unwrap();
        for name in ["f.A", "f.B"] {
            registry
                .define(TypeDecl::class(name).extends("f.Parent"))
                .unwrap();
        }
        registry
            .define(
                TypeDecl::class("f.C")
                    .extends("f.Parent")
                    .auto_property(AutoProperty::fields())
                    .field(FieldDecl::new("y", ValueKind::object())),
            )
            .unwrap();
        registry.define(TypeDecl::class("f.Stranger")).unwrap();
        registry
    }

    #[test]
    fn test_compatibility_partition() {
        let registry = family();
        let get = |n: &str| registry.get(n).unwrap();
        let compatible = |a: &str, b: &str| {
            let schema = resolve(&get(a)).unwrap();
            schema.is_compatible_with(&get(b), resolve_arc)
        };

        assert!(compatible("f.A", "f.Parent"));
        assert!(compatible("f.Parent", "f.A"));
        assert!(compatible("f.A", "f.B"));
        assert!(compatible("f.B", "f.A"));

        assert!(!compatible("f.Parent", "f.C"));
        assert!(!compatible("f.C", "f.Parent"));
        assert!(!compatible("f.A", "f.C"));
        assert!(compatible("f.C", "f.C"));
        assert!(!compatible("f.Parent", "f.Stranger"));
    }

    #[test]
    fn test_sealed_compatibility_is_one_directional() {
        let registry = TypeRegistry::new();
        let root = registry
            .define(
                TypeDecl::class("g.Root")
                    .auto_property(AutoProperty::fields())
                    .equality(EqualityMarker::SubclassCannotOverrideEquals)
                    .field(FieldDecl::new("x", ValueKind::object())),
            )
            .unwrap();
        let leaf = registry
            .define(
                TypeDecl::class("g.Leaf")
                    .extends("g.Root")
                    .auto_property(AutoProperty::fields())
                    .field(FieldDecl::new("y", ValueKind::object())),
            )
            .unwrap();
        let root_schema = resolve(&root).unwrap();
        assert!(root_schema.is_compatible_with(&leaf, resolve_arc));

        let leaf_schema = resolve(&leaf).unwrap();
        assert!(leaf_schema.equality_root().is_same(&leaf));
        assert!(!leaf_schema.is_compatible_with(&root, resolve_arc));
    }

    #[test]
    fn test_compatibility_with_broken_type_is_false() {
        let registry = family();
        let broken = registry
            .define(TypeDecl::class("f.Broken").extends("f.Parent").field(
                FieldDecl::new("K", ValueKind::object())
                    .static_member()
                    .marked(MemberPolicy::All),
            ))
            .unwrap();
        let parent = resolve(&registry.get("f.Parent").unwrap()).unwrap();
        assert!(!parent.is_compatible_with(&broken, resolve_arc));
    }
}
