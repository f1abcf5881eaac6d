#[test]
fn casefile_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/casefile_error_pass.rs");
}
