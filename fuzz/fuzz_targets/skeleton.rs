#![no_main]

#[path = "../../tests/common/skeleton.rs"]
mod skeleton;

use flowscope::{
    ast::{AstBuilder, UnderlyingAst},
    types::ClassHierarchy,
    BuilderOptions, CfgBuilder,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let body = skeleton::skeleton(data);
    let class = AstBuilder::new().class("Fuzz", vec![]);
    let hierarchy = ClassHierarchy::with_java_lang();

    let mut cfg = CfgBuilder::new(&hierarchy)
        .with_options(BuilderOptions::unsimplified())
        .build(UnderlyingAst::arbitrary(&body, &class))
        .unwrap();
    cfg.check_invariants().unwrap();

    cfg.simplify();
    cfg.check_invariants().unwrap();

    let once = cfg.to_string();
    cfg.simplify();
    assert_eq!(cfg.to_string(), once);
});
