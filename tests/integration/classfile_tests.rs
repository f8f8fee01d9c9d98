//! Integration tests for class-file scanning
//!
//! Each test assembles real class-file bytes with the fixture builder
//! and checks which referenced classes come out of a full scan.

mod common;

use common::{class_referencing, insn, ClassFileBuilder};
use depscan::{scan_class, AnalyzerError, ExclusionPatterns, ParseError};

/// Scan with no exclusions; referenced classes in sorted order.
fn scan(name: &str, bytes: &[u8]) -> Vec<String> {
    scan_class(name, bytes, &ExclusionPatterns::default())
        .expect("scan failed")
        .into_iter()
        .map(|usage| usage.dependency_class)
        .collect()
}

fn has(refs: &[String], name: &str) -> bool {
    refs.iter().any(|r| r == name)
}

// ============================================================================
// Constant Pool Scan Tests
// ============================================================================

mod pool_scan_tests {
    use super::*;

    #[test]
    fn pool_class_entries_are_collected_without_structural_use() {
        let mut builder = ClassFileBuilder::new("demo/Subject");
        builder.class("com/pool/OnlyInPool");
        let refs = scan("demo.Subject", &builder.build());

        assert!(has(&refs, "com.pool.OnlyInPool"));
    }

    #[test]
    fn method_handle_target_is_collected_through_the_pool() {
        let mut builder = ClassFileBuilder::new("demo/Handles");
        let target = builder.method_ref("com/mh/Target", "factory", "()V");
        builder.method_handle(target);
        let refs = scan("demo.Handles", &builder.build());

        assert!(has(&refs, "com.mh.Target"));
    }

    #[test]
    fn unnamed_package_entries_are_ignored() {
        let mut builder = ClassFileBuilder::new("NoPkg");
        builder.class("Solo");
        let refs = scan("NoPkg", &builder.build());

        assert!(!has(&refs, "Solo"));
        assert!(has(&refs, "java.lang.Object"));
    }

    #[test]
    fn long_constants_do_not_shift_later_entries() {
        let mut builder = ClassFileBuilder::new("demo/Wide");
        builder.long_constant(u64::MAX);
        builder.class("com/after/TheLong");
        let refs = scan("demo.Wide", &builder.build());

        assert!(has(&refs, "com.after.TheLong"));
    }
}

// ============================================================================
// Hierarchy and Signature Tests
// ============================================================================

mod hierarchy_tests {
    use super::*;

    #[test]
    fn superclass_and_interfaces_are_references() {
        let mut builder = ClassFileBuilder::new("demo/Impl");
        builder.extends("com/base/Parent");
        builder.implements("com/api/First");
        builder.implements("com/api/Second");
        let refs = scan("demo.Impl", &builder.build());

        assert!(has(&refs, "com.base.Parent"));
        assert!(has(&refs, "com.api.First"));
        assert!(has(&refs, "com.api.Second"));
    }

    #[test]
    fn class_signature_contributes_type_arguments() {
        let mut builder = ClassFileBuilder::new("demo/Generic");
        let sig = builder.signature_attribute("Lcom/generic/Base<Lcom/generic/Arg;>;");
        builder.class_attribute(sig);
        let refs = scan("demo.Generic", &builder.build());

        // the type argument exists only inside the signature string
        assert!(has(&refs, "com.generic.Base"));
        assert!(has(&refs, "com.generic.Arg"));
    }

    #[test]
    fn field_descriptor_type_is_a_reference() {
        let mut builder = ClassFileBuilder::new("demo/Holder");
        builder.field("value", "Lcom/field/Held;");
        let refs = scan("demo.Holder", &builder.build());

        assert!(has(&refs, "com.field.Held"));
    }

    #[test]
    fn field_signature_supersedes_its_descriptor() {
        let mut builder = ClassFileBuilder::new("demo/GenericHolder");
        let sig = builder.signature_attribute("Lcom/field/Wrap<Lcom/field/Param;>;");
        builder.field_with("value", "Lcom/field/Raw;", vec![sig]);
        let refs = scan("demo.GenericHolder", &builder.build());

        assert!(has(&refs, "com.field.Wrap"));
        assert!(has(&refs, "com.field.Param"));
        // the raw descriptor type is never a pool class entry, so the
        // superseded descriptor leaves no trace
        assert!(!has(&refs, "com.field.Raw"));
    }

    #[test]
    fn method_descriptor_types_are_references() {
        let mut builder = ClassFileBuilder::new("demo/Service");
        builder.method("handle", "(Lcom/svc/Request;I)Lcom/svc/Response;");
        let refs = scan("demo.Service", &builder.build());

        assert!(has(&refs, "com.svc.Request"));
        assert!(has(&refs, "com.svc.Response"));
    }

    #[test]
    fn method_signature_supersedes_descriptor_but_throws_remain() {
        let mut builder = ClassFileBuilder::new("demo/Thrower");
        let sig = builder.signature_attribute("(Lcom/m/Gen;)V");
        let exceptions = builder.exceptions_attribute(&["com/m/Boom"]);
        builder.method_with("run", "(Lcom/m/Raw;)V", vec![sig, exceptions]);
        let refs = scan("demo.Thrower", &builder.build());

        assert!(has(&refs, "com.m.Gen"));
        assert!(has(&refs, "com.m.Boom"));
        assert!(!has(&refs, "com.m.Raw"));
    }
}

// ============================================================================
// Code Attribute Tests
// ============================================================================

mod code_tests {
    use super::*;

    #[test]
    fn instruction_operands_contribute_references() {
        let mut builder = ClassFileBuilder::new("demo/Body");
        let created = builder.class("com/code/Created");
        let cast = builder.class("com/code/Cast");
        let field = builder.field_ref("com/code/Owner", "CONST", "Lcom/code/FieldType;");
        let method = builder.method_ref("com/code/Callee", "call", "(Lcom/code/Arg;)V");

        let mut code = Vec::new();
        code.extend_from_slice(&insn::new_instance(created));
        code.extend_from_slice(&insn::checkcast(cast));
        code.extend_from_slice(&insn::get_static(field));
        code.extend_from_slice(&insn::invoke_virtual(method));
        code.extend_from_slice(&insn::vreturn());
        let attr = builder.code_attribute(&code);
        builder.method_with("run", "()V", vec![attr]);
        let refs = scan("demo.Body", &builder.build());

        assert!(has(&refs, "com.code.Created"));
        assert!(has(&refs, "com.code.Cast"));
        assert!(has(&refs, "com.code.Owner"));
        // descriptor types behind the member references, not pool entries
        assert!(has(&refs, "com.code.FieldType"));
        assert!(has(&refs, "com.code.Arg"));
        assert!(has(&refs, "com.code.Callee"));
    }

    #[test]
    fn invokedynamic_call_site_descriptor_is_scanned() {
        let mut builder = ClassFileBuilder::new("demo/Lambdas");
        let indy = builder.invoke_dynamic("apply", "(Lcom/indy/Arg;)Lcom/indy/Ret;");
        let mut code = insn::invoke_dynamic(indy);
        code.extend_from_slice(&insn::pop());
        code.extend_from_slice(&insn::vreturn());
        let attr = builder.code_attribute(&code);
        builder.method_with("run", "()V", vec![attr]);
        let refs = scan("demo.Lambdas", &builder.build());

        assert!(has(&refs, "com.indy.Arg"));
        assert!(has(&refs, "com.indy.Ret"));
    }

    #[test]
    fn catch_types_are_references_and_catch_all_is_skipped() {
        let mut builder = ClassFileBuilder::new("demo/Catcher");
        let mut code = insn::athrow();
        code.extend_from_slice(&insn::vreturn());
        let attr =
            builder.code_attribute_with(&code, &[Some("com/err/Custom"), None], vec![]);
        builder.method_with("run", "()V", vec![attr]);
        let refs = scan("demo.Catcher", &builder.build());

        assert!(has(&refs, "com.err.Custom"));
    }

    #[test]
    fn local_variable_signature_supersedes_descriptor() {
        let mut builder = ClassFileBuilder::new("demo/Locals");
        let descs = builder.local_variable_table(&[
            (0, 1, "Lcom/lv/RawVar;"),
            (0, 2, "Lcom/lv/OnlyDesc;"),
        ]);
        let sigs = builder.local_variable_type_table(&[(0, 1, "Lcom/lv/Gen<Lcom/lv/P;>;")]);
        let attr = builder.code_attribute_with(&insn::vreturn(), &[], vec![descs, sigs]);
        builder.method_with("run", "()V", vec![attr]);
        let refs = scan("demo.Locals", &builder.build());

        // slot 1 is generic, slot 2 only has a descriptor
        assert!(has(&refs, "com.lv.Gen"));
        assert!(has(&refs, "com.lv.P"));
        assert!(has(&refs, "com.lv.OnlyDesc"));
        assert!(!has(&refs, "com.lv.RawVar"));
    }

    #[test]
    fn ldc_reads_narrow_and_wide_constants() {
        let mut builder = ClassFileBuilder::new("demo/Loads");
        let text = builder.string("just a string");
        let literal = builder.class("com/ldc/Literal");
        let mut code = insn::ldc(text as u8);
        code.extend_from_slice(&insn::pop());
        code.extend_from_slice(&insn::ldc_w(literal));
        code.extend_from_slice(&insn::pop());
        code.extend_from_slice(&insn::vreturn());
        let attr = builder.code_attribute(&code);
        builder.method_with("run", "()V", vec![attr]);
        let refs = scan("demo.Loads", &builder.build());

        assert!(has(&refs, "com.ldc.Literal"));
    }

    #[test]
    fn array_class_literals_unwrap_to_their_component() {
        let mut builder = ClassFileBuilder::new("demo/Arrays");
        let array = builder.class("[Lcom/arr/Elem;");
        let mut code = insn::multianewarray(array);
        code.extend_from_slice(&insn::pop());
        code.extend_from_slice(&insn::vreturn());
        let attr = builder.code_attribute(&code);
        builder.method_with("run", "()V", vec![attr]);
        let refs = scan("demo.Arrays", &builder.build());

        assert!(has(&refs, "com.arr.Elem"));
        assert!(!refs.iter().any(|r| r.starts_with('[')));
    }
}

// ============================================================================
// Annotation Tests
// ============================================================================

mod annotation_tests {
    use super::*;

    #[test]
    fn annotation_types_are_references_at_every_site() {
        let mut builder = ClassFileBuilder::new("demo/Annotated");
        let on_class = builder.annotations_attribute(&["Lcom/ann/OnClass;"]);
        builder.class_attribute(on_class);
        let on_field = builder.annotations_attribute(&["Lcom/ann/OnField;"]);
        builder.field_with("value", "I", vec![on_field]);
        let on_method = builder.annotations_attribute(&["Lcom/ann/OnMethod;"]);
        builder.method_with("run", "()V", vec![on_method]);
        let refs = scan("demo.Annotated", &builder.build());

        assert!(has(&refs, "com.ann.OnClass"));
        assert!(has(&refs, "com.ann.OnField"));
        assert!(has(&refs, "com.ann.OnMethod"));
    }

    #[test]
    fn class_and_enum_element_values_are_references() {
        let mut builder = ClassFileBuilder::new("demo/Configured");
        let payload = builder.class_value("Lcom/ann/Payload;");
        let color = builder.enum_value("Lcom/ann/Color;", "RED");
        let text = builder.string_value("ignored");
        let value = ClassFileBuilder::array_value(&[payload, color, text]);
        let attr = builder.annotation_attribute_with_value("Lcom/ann/Options;", value);
        builder.method_with("run", "()V", vec![attr]);
        let refs = scan("demo.Configured", &builder.build());

        assert!(has(&refs, "com.ann.Options"));
        assert!(has(&refs, "com.ann.Payload"));
        assert!(has(&refs, "com.ann.Color"));
    }

    #[test]
    fn annotation_defaults_are_scanned() {
        let mut builder = ClassFileBuilder::new("demo/WithDefault");
        let fallback = builder.enum_value("Lcom/ann/Mode;", "AUTO");
        let attr = builder.annotation_default_attribute(fallback);
        // primitive return type, so the enum comes from the default alone
        builder.method_with("mode", "()I", vec![attr]);
        let refs = scan("demo.WithDefault", &builder.build());

        assert!(has(&refs, "com.ann.Mode"));
    }
}

// ============================================================================
// Collection Policy Tests
// ============================================================================

mod collection_tests {
    use super::*;

    #[test]
    fn inner_classes_fold_to_their_container() {
        let bytes = class_referencing("com.app.Main", &["com.dep.Outer$Inner"]);
        let refs = scan("com.app.Main", &bytes);

        assert!(has(&refs, "com.dep.Outer"));
        assert!(!refs.iter().any(|r| r.contains('$')));
    }

    #[test]
    fn exclusions_drop_matching_references() {
        let bytes = class_referencing("com.app.Main", &["com.gen.Model", "com.keep.Service"]);
        let exclusions = ExclusionPatterns::compile([r"com\.gen\..*"]).unwrap();
        let set = scan_class("com.app.Main", &bytes, &exclusions).unwrap();

        let refs: Vec<String> = set.into_iter().map(|u| u.dependency_class).collect();
        assert!(has(&refs, "com.keep.Service"));
        assert!(!has(&refs, "com.gen.Model"));
    }

    #[test]
    fn every_usage_is_labeled_with_the_scanned_class() {
        let bytes = class_referencing("com.app.Main", &["com.dep.A", "com.dep.B"]);
        let set = scan_class("com.app.Main", &bytes, &ExclusionPatterns::default()).unwrap();

        assert!(!set.is_empty());
        assert!(set.iter().all(|usage| usage.used_by == "com.app.Main"));
    }

    #[test]
    fn scanning_the_same_bytes_twice_is_equal() {
        let bytes = class_referencing("com.app.Main", &["com.dep.A", "com.dep.B", "com.dep.C"]);
        let exclusions = ExclusionPatterns::default();

        let first = scan_class("com.app.Main", &bytes, &exclusions).unwrap();
        let second = scan_class("com.app.Main", &bytes, &exclusions).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}

// ============================================================================
// Malformed Input Tests
// ============================================================================

mod malformed_tests {
    use super::*;

    #[test]
    fn truncated_class_is_a_labeled_error() {
        let mut bytes = class_referencing("com.app.Cut", &["com.dep.A"]);
        bytes.truncate(bytes.len() - 10);
        let err = scan_class("com.app.Cut", &bytes, &ExclusionPatterns::default()).unwrap_err();

        assert!(err.to_string().contains("com.app.Cut"));
        assert!(matches!(err, AnalyzerError::MalformedClass { .. }));
    }

    #[test]
    fn truncated_pool_reports_the_offset_kind() {
        let bytes = class_referencing("com.app.Cut", &["com.dep.A"]);
        // cut inside the constant pool
        let err =
            scan_class("com.app.Cut", &bytes[..20], &ExclusionPatterns::default()).unwrap_err();

        assert!(matches!(
            err,
            AnalyzerError::MalformedClass {
                source: ParseError::Truncated { .. },
                ..
            }
        ));
    }
}
