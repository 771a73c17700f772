//! Build script for minifying the embedded dev loader script.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::fs;
use std::path::Path;

/// Placeholder replaced at runtime with the JSON list of module scripts.
const LOADER_FILES_PLACEHOLDER: &str = "__COLLATE_FILES__";

fn main() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let out_path = Path::new(&out_dir);

    minify_loader_js_file("src/embed/dev/loader.js", &out_path.join("loader.min.js"));

    println!("cargo:rerun-if-changed=src/embed/dev/loader.js");
    println!("cargo:rerun-if-changed=src/embed/dev/loader.css");
}

fn minify_js(source: &str) -> String {
    let allocator = Allocator::default();
    let source_type = SourceType::cjs();

    let ret = Parser::new(&allocator, source, source_type).parse();
    assert!(ret.errors.is_empty(), "Parse errors: {:?}", ret.errors);

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code
}

fn minify_loader_js_file(input: &str, output: &Path) {
    let source = fs::read_to_string(input).expect("Failed to read loader.js");

    let count = source.matches(LOADER_FILES_PLACEHOLDER).count();
    assert_eq!(
        count, 1,
        "loader.js must contain exactly one {} placeholder",
        LOADER_FILES_PLACEHOLDER
    );

    let code = minify_js(&source);
    assert!(
        code.contains(LOADER_FILES_PLACEHOLDER),
        "minification dropped the {} placeholder",
        LOADER_FILES_PLACEHOLDER
    );
    fs::write(output, code).expect("Failed to write minified loader JS");
}
