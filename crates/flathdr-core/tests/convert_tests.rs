//! End-to-end conversion tests.
//!
//! Each test feeds a header fragment through the whole line pipeline and
//! compares the produced text.

use flathdr_common::DiagnosticLevel;
use flathdr_config::{ConverterConfig, SuppressMode};
use flathdr_core::{convert_file, convert_str, ConvertError, ConvertReport};
use std::fs;

fn convert(input: &str) -> String {
    convert_with(input, &ConverterConfig::default()).0
}

fn convert_with(input: &str, config: &ConverterConfig) -> (String, ConvertReport) {
    convert_str(input, config).unwrap()
}

fn suppress(mode: SuppressMode) -> ConverterConfig {
    let mut config = ConverterConfig::default();
    config.conversion.suppressed_declarations = mode;
    config
}

fn strs<S: AsRef<str>>(items: &[S]) -> Vec<&str> {
    items.iter().map(AsRef::as_ref).collect()
}

/// Open minus closed braces over the lines that are not `//` comments.
fn brace_balance(output: &str) -> i32 {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .flat_map(str::chars)
        .map(|c| match c {
            '{' => 1,
            '}' => -1,
            _ => 0,
        })
        .sum()
}

const CLASS_WITH_ENUM: &str = "\
class Foo
{
public:
    // comment
    enum Kind
    {
        A,
        B
    };
    int value;
};
";

const CLASS_WITH_METHODS: &str = "\
class Bar {
    int x;
    int Get() const
    {
        return x;
    }
    void Set(int v);
};
";

const STRUCT_WITH_VIRTUALS: &str = "\
struct IFoo
{
    virtual HRESULT GetValue(int x);
    virtual Status WINAPI Draw(INT x, INT y) = 0;
};
";

#[test]
fn test_const_member_becomes_define() {
    assert_eq!(convert("const int kMax = 10;\n"), "#define kMax (10)\n");
    assert_eq!(
        convert("    const REAL FlatnessDefault = 1.0f/4.0f;\n"),
        "    #define FlatnessDefault (1.0f/4.0f)\n"
    );
}

#[test]
fn test_struct_virtuals_become_function_pointers() {
    assert_eq!(
        convert(STRUCT_WITH_VIRTUALS),
        "typedef struct _IFoo\n{\n    HRESULT (*GetValue)(int x);\n    Status (*Draw)(INT x, INT y);\n} IFoo;\n"
    );
}

#[test]
fn test_virtual_template_is_configurable() {
    let mut config = ConverterConfig::default();
    config.conversion.virtual_method_template = "$1 ($2*$3)($4);".to_string();

    let (out, _) = convert_with(STRUCT_WITH_VIRTUALS, &config);
    assert!(out.contains("    HRESULT (*GetValue)(int x);\n"));
    assert!(out.contains("    Status (WINAPI *Draw)(INT x, INT y);\n"));
}

#[test]
fn test_class_enum_is_hoisted_after_struct() {
    let (out, report) = convert_with(CLASS_WITH_ENUM, &ConverterConfig::default());

    assert_eq!(
        out,
        "typedef struct _Foo\n{\n    int value;\n} Foo;\n// comment\ntypedef enum _Kind\n{\n    Foo_A,\n    Foo_B\n} Kind;\n"
    );
    assert_eq!(strs(&report.enum_values), ["Foo_A", "Foo_B"]);
    assert_eq!(report.classes.len(), 1);
    assert_eq!(report.classes[0].name.as_str(), "Foo");
    assert_eq!(strs(&report.classes[0].members), ["value"]);
}

#[test]
fn test_class_methods_are_annotated() {
    let (out, report) = convert_with(CLASS_WITH_METHODS, &ConverterConfig::default());

    assert_eq!(
        out,
        "typedef struct _Bar\n{\n    int x;\n} Bar;\n\
         //(1) int Get() const\n//(2) {\n//(2)     return x;\n//(0) }\n//(0) void Set(int v);\n"
    );

    let names: Vec<_> = report.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Get", "Set"]);
    assert!(report.functions[0].params.is_empty());
    assert_eq!(strs(&report.functions[1].params), ["v"]);
}

#[test]
fn test_suppressed_lines_as_comments() {
    let (out, _) = convert_with(CLASS_WITH_METHODS, &suppress(SuppressMode::Comment));
    assert_eq!(
        out,
        "typedef struct _Bar\n{\n    int x;\n} Bar;\n\
         // int Get() const\n// {\n//     return x;\n// }\n// void Set(int v);\n"
    );
}

#[test]
fn test_suppressed_lines_dropped() {
    let (out, report) = convert_with(CLASS_WITH_METHODS, &suppress(SuppressMode::Drop));
    assert_eq!(out, "typedef struct _Bar\n{\n    int x;\n} Bar;\n");
    assert_eq!(report.functions.len(), 2);
}

#[test]
fn test_free_function_prototype_is_suppressed() {
    assert_eq!(
        convert("Status WINAPI GdipFoo(INT x,\n    INT y);\nINT count;\n"),
        "//(-1) Status WINAPI GdipFoo(INT x,\n//(0)     INT y);\nINT count;\n"
    );
}

#[test]
fn test_inline_line_is_suppressed() {
    assert_eq!(
        convert("inline VOID Reset(INT mode);\nINT count;\n"),
        "//(0) inline VOID Reset(INT mode);\nINT count;\n"
    );
}

#[test]
fn test_output_braces_balance() {
    for input in [CLASS_WITH_ENUM, CLASS_WITH_METHODS, STRUCT_WITH_VIRTUALS] {
        for mode in [SuppressMode::Annotate, SuppressMode::Comment, SuppressMode::Drop] {
            let (out, _) = convert_with(input, &suppress(mode));
            assert_eq!(brace_balance(&out), 0, "unbalanced output:\n{}", out);
        }
    }
}

#[test]
fn test_enum_values_are_deduplicated() {
    let input = "enum Unit\n{\n    UnitWorld,\n    UnitPixel,\n    UnitWorld\n};\n";
    let (out, report) = convert_with(input, &ConverterConfig::default());

    assert_eq!(
        out,
        "typedef enum _Unit\n{\n    UnitWorld,\n    UnitPixel,\n    UnitWorld\n} Unit;\n"
    );
    assert_eq!(strs(&report.enum_values), ["UnitWorld", "UnitPixel"]);
}

#[test]
fn test_anonymous_types() {
    assert_eq!(
        convert("enum\n{\n    First = 1\n};\n"),
        "enum\n{\n    First = 1\n};\n"
    );
    assert_eq!(
        convert("struct {\n    INT a;\n};\n"),
        "struct\n{\n    INT a;\n};\n"
    );
}

#[test]
fn test_declspec_is_skipped() {
    assert_eq!(
        convert("struct __declspec(novtable) IImage\n{\n};\n"),
        "typedef struct _IImage\n{\n} IImage;\n"
    );
}

#[test]
fn test_forward_declarations() {
    assert_eq!(convert("class Graphics;\n"), "struct _Graphics;\n");
    assert_eq!(convert("struct Pen;\n"), "struct Pen;\n");
    assert_eq!(convert("enum Unit;\n"), "enum Unit;\n");
}

#[test]
fn test_extern_c_wrapper_is_dropped() {
    assert_eq!(convert("extern \"C\" {\nINT count;\n}\n"), "INT count;\n");
}

#[test]
fn test_comments_pass_through() {
    let input = "/* GDI+\n   types */\n// line\nINT count;\n";
    assert_eq!(convert(input), input);
}

#[test]
fn test_blank_lines_pass_through() {
    assert_eq!(convert("\n\nINT count;\n\n"), "\n\nINT count;\n\n");
}

#[test]
fn test_unterminated_last_line() {
    assert_eq!(convert("const int kMax = 10;"), "#define kMax (10)");
}

#[test]
fn test_macro_rewrite() {
    let input = "#define GDIP_WMF_RECORD_TO_EMFPLUS(n) ((EmfPlusRecordType)((n) | GDIP_WMF_RECORDBASE))\n";
    let (out, report) = convert_with(input, &ConverterConfig::default());
    assert_eq!(
        out,
        "#define GDIP_WMF_RECORD_TO_EMFPLUS(n) ((enum _EmfPlusRecordType)((n) | GDIP_WMF_RECORDBASE))\n"
    );
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].level, DiagnosticLevel::Info);
    assert_eq!(report.diagnostics[0].line, Some(1));
    assert_eq!(
        convert("#define OTHER(n) ((EmfPlusRecordType)(n))\n"),
        "#define OTHER(n) ((EmfPlusRecordType)(n))\n"
    );
}

#[test]
fn test_unmatched_lines_are_unchanged() {
    let input = "#include <windows.h>\n#define GDIPCONST const\ntypedef float REAL;\n";
    assert_eq!(convert(input), input);
}

#[test]
fn test_conversion_is_idempotent() {
    for input in [CLASS_WITH_ENUM, CLASS_WITH_METHODS, STRUCT_WITH_VIRTUALS] {
        let once = convert(input);
        assert_eq!(convert(&once), once);
    }
}

#[test]
fn test_file_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("GdiPlusTypes.h");
    let output = dir.path().join("out.h");
    fs::write(&input, CLASS_WITH_ENUM).unwrap();

    let report = convert_file(&input, &output, &ConverterConfig::default()).unwrap();

    assert_eq!(report.lines, 11);
    assert_eq!(fs::read_to_string(&output).unwrap(), convert(CLASS_WITH_ENUM));
    assert!(!dir.path().join("out.h.partial").exists());
}

#[test]
fn test_missing_input_creates_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.h");

    let err = convert_file(
        &dir.path().join("missing.h"),
        &output,
        &ConverterConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, ConvertError::InputNotFound { .. }));
    assert!(!output.exists());
}

#[test]
fn test_failed_conversion_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.h");
    let output = dir.path().join("out.h");
    fs::write(&input, "INT a, b, c, d, e;\n").unwrap();

    let mut config = ConverterConfig::default();
    config.conversion.max_tokens = 4;
    let err = convert_file(&input, &output, &config).unwrap_err();

    assert!(matches!(err, ConvertError::TooManyTokens { line: 1, limit: 4 }));
    assert!(!output.exists());
    assert!(!dir.path().join("out.h.partial").exists());
}

#[test]
fn test_single_line_class_enum_keeps_its_comment() {
    let input = "class Foo {\n    // flags\n    enum { A, B = 2 };\n    int value;\n};\n";
    let (out, report) = convert_with(input, &ConverterConfig::default());

    assert_eq!(
        out,
        "typedef struct _Foo\n{\n    int value;\n} Foo;\n// flags\nenum { Foo_A, Foo_B = 2 };\n"
    );
    assert_eq!(strs(&report.enum_values), ["Foo_A", "Foo_B"]);
    assert_eq!(convert(&out), out);
}

#[test]
fn test_single_line_named_enum() {
    assert_eq!(
        convert("enum Kind { Small, Large };\n"),
        "typedef enum _Kind { Small, Large } Kind;\n"
    );
}

#[test]
fn test_class_members_are_deduplicated_per_class() {
    let input = "class X {\n    int a;\n    int a;\n};\nclass Y {\n    int a;\n};\n";
    let (_, report) = convert_with(input, &ConverterConfig::default());

    assert_eq!(report.classes.len(), 2);
    assert_eq!(report.classes[0].name.as_str(), "X");
    assert_eq!(strs(&report.classes[0].members), ["a"]);
    assert_eq!(report.classes[1].name.as_str(), "Y");
    assert_eq!(strs(&report.classes[1].members), ["a"]);
}
