// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_runbook(size: usize) -> String {
    let base = "# Step\n\nInstall with `npm ci` {{ execute }} then `npm test` {{ execute 't2' interrupt }}.\n\n`Back up first` {{ warning }}\n\n```bash {{ execute }}\ncargo build\ncargo test\n```\n\n```sh\n# per line\n`make lint` {{ copy }}\n```\n\n```quiz\nQ: Which tool?\nA) npm\nB) cargo\n```\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_plain_markdown(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with some `code` content.\n\n- Bullet point\n  - Nested item\n- Another item\n\n";
    base.repeat(size)
}
