#[test]
fn read_once_ui() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/ui/read_once_public_field.rs");
    t.compile_fail("tests/ui/read_once_forbidden_derive.rs");
    t.compile_fail("tests/ui/read_once_generic.rs");
}
