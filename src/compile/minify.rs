// src/compile/minify.rs

//! Minification for compiled CSS and concatenated JS.
//!
//! Uses lightningcss for CSS and oxc for JavaScript. Errors are returned as
//! plain messages; callers attach the offending path.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, CompressOptionsUnused, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// Browser scripts are classic scripts: their top-level bindings are globals
/// shared across files and with the page, so they are never renamed or
/// dropped, even when nothing in the bundle refers to them.
fn script_source_type() -> SourceType {
    SourceType::script()
}

/// Parse `source` as a classic script and report the first syntax error.
pub fn check_js(source: &str) -> Result<(), String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, script_source_type()).parse();
    match ret.errors.first() {
        Some(err) => Err(err.to_string()),
        None if ret.panicked => Err("parser aborted".to_string()),
        None => Ok(()),
    }
}

/// Minify JavaScript source code.
pub fn minify_js(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, script_source_type()).parse();
    if let Some(err) = ret.errors.first() {
        return Err(err.to_string());
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions {
            top_level: Some(false),
            ..MangleOptions::default()
        }),
        compress: Some(CompressOptions {
            unused: CompressOptionsUnused::Keep,
            ..CompressOptions::smallest()
        }),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Result<String, String> {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}
