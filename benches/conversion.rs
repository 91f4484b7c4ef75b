//! Benchmarks for the document conversion pipeline.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use helpdown::{convert_str, ConvertOptions, Format};

/// Build a synthetic export with the structures the converter spends its
/// time on: lists with continuations, drop-downs, admonitions, tables.
fn sample_document(sections: usize) -> String {
    let mut html = String::from("<html><head><title>Benchmark</title></head><body>");
    for i in 0..sections {
        html.push_str(&format!("<h2>Section {i}</h2>"));
        html.push_str("<p>Some <b>introductory</b> prose with a <a href=\"#anchor\">link</a>.</p>");
        html.push_str("<ol><li>First step</li><li>Second step<ol><li>Nested detail</li></ol></li><li>Third step</li></ol>");
        html.push_str("<p class=\"note\">Remember this.</p>");
        html.push_str("<ol><li>Fourth step continues numbering</li></ol>");
        html.push_str(
            "<MadCap:dropDown><MadCap:dropDownHead><MadCap:dropDownHotspot>Details</MadCap:dropDownHotspot></MadCap:dropDownHead>\
             <MadCap:dropDownBody><p>Hidden content.</p></MadCap:dropDownBody></MadCap:dropDown>",
        );
        html.push_str("<table><tr><th>Key</th><th>Value</th></tr><tr><td>a</td><td>1</td></tr></table>");
    }
    html.push_str("</body></html>");
    html
}

fn bench_asciidoc(c: &mut Criterion) {
    let source = sample_document(100);
    let options = ConvertOptions::new(Format::AsciiDoc);
    c.bench_function("convert_asciidoc", |b| {
        b.iter(|| convert_str(&source, &options).unwrap());
    });
}

fn bench_markdown(c: &mut Criterion) {
    let source = sample_document(100);
    let options = ConvertOptions::new(Format::Markdown);
    c.bench_function("convert_markdown", |b| {
        b.iter(|| convert_str(&source, &options).unwrap());
    });
}

fn bench_parse_only(c: &mut Criterion) {
    let source = sample_document(100);
    c.bench_function("parse_document", |b| {
        b.iter(|| helpdown::dom::parse_document(&source));
    });
}

criterion_group!(benches, bench_asciidoc, bench_markdown, bench_parse_only);
criterion_main!(benches);
