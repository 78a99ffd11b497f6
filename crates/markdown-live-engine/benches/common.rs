// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with **some** content and a ~~typo~~.\n\n- Bullet point\n  - Nested item\n- Another item\n\n1. First\n2. Second\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_nested_list(items: usize, depth: usize) -> String {
    let mut content = String::new();
    for i in 0..items {
        let indent = "  ".repeat(i % depth);
        content.push_str(&format!("{indent}- Item {i} at level {}\n", i % depth));
    }
    content
}
