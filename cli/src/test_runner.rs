use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use blockly::parser::tree;
use blockly::{ParseError, Parser, ParserConfig, Registry};
use serde::Deserialize;

const TEST_SUFFIX: &str = ".test.xml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// If true, the test expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Expected parse error: the message must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Expected error kind name, e.g. `UnknownBlockType`.
    #[serde(default)]
    pub expect_kind: Option<String>,

    /// If set, the error span must start on this 1-based source line.
    #[serde(default)]
    pub expect_error_line: Option<usize>,

    /// Expected `type` of the root block.
    #[serde(default)]
    pub expect_root: Option<String>,

    /// Expected tag tree outline (trimmed comparison).
    #[serde(default)]
    pub expect_tree: Option<String>,
}

impl TestConfig {
    fn expects_failure(&self) -> bool {
        self.expect_parse_error
            || self.expect_error.is_some()
            || self.expect_kind.is_some()
            || self.expect_error_line.is_some()
    }
}

/// Split a `.test.xml` file into its TOML config and XML source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest_start = close_pos + 4; // skip \n---
    let source = after_open[rest_start..]
        .strip_prefix("\r\n")
        .or_else(|| after_open[rest_start..].strip_prefix('\n'))
        .unwrap_or(&after_open[rest_start..]);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path, registry: &Registry, parser_config: &ParserConfig) -> TestResult {
    // 1. Read file
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    // 2. Parse frontmatter
    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("frontmatter error: {}", e)),
            };
        }
    };

    let outcome = match check_source(source, &config, registry, parser_config) {
        None => TestOutcome::Pass,
        Some(reason) => TestOutcome::Fail(reason),
    };

    TestResult {
        path: path.to_path_buf(),
        description: config.description,
        outcome,
    }
}

/// Parse `source` and compare against the expectations. Returns `Some(reason)` on mismatch.
fn check_source(
    source: &str,
    config: &TestConfig,
    registry: &Registry,
    parser_config: &ParserConfig,
) -> Option<String> {
    let parser = Parser::with_config(registry, parser_config.clone());
    let result = parser.parse(source);

    if config.expects_failure() {
        return match result {
            Ok(_) => Some("expected parse error, but parsing succeeded".into()),
            Err(err) => check_error(source, &err, config),
        };
    }

    if let Err(err) = result {
        return Some(format!("unexpected parse error [{}]: {}", err.kind.name(), err));
    }

    // Binding succeeded, so the tree builds too.
    let roots = match parser.parse_tree(source) {
        Ok(roots) => roots,
        Err(err) => return Some(format!("unexpected tree error: {}", err)),
    };

    if let Some(expected_root) = &config.expect_root {
        let actual = tree::root_block(&roots).and_then(|node| node.attribute("type"));
        if actual != Some(expected_root.as_str()) {
            return Some(format!(
                "root mismatch\n  expected: {}\n  actual:   {}",
                expected_root,
                actual.unwrap_or("(none)")
            ));
        }
    }

    if let Some(expected_tree) = &config.expect_tree {
        let actual: String = roots.iter().map(|root| root.to_string()).collect();
        if actual.trim() != expected_tree.trim() {
            return Some(format!(
                "tree mismatch\n  expected:\n{}\n  actual:\n{}",
                indent(expected_tree.trim()),
                indent(actual.trim())
            ));
        }
    }

    None
}

fn check_error(source: &str, err: &ParseError, config: &TestConfig) -> Option<String> {
    if let Some(expected_kind) = &config.expect_kind {
        if err.kind.name() != expected_kind {
            return Some(format!(
                "expected error kind {}, got {}: {}",
                expected_kind,
                err.kind.name(),
                err
            ));
        }
    }

    if let Some(expected_err) = &config.expect_error {
        if !err.message.contains(expected_err.as_str()) {
            return Some(format!(
                "expected error containing \"{}\", got: {}",
                expected_err, err
            ));
        }
    }

    if let Some(expected_line) = config.expect_error_line {
        let actual_line = byte_offset_to_line(source, err.span.start);
        if actual_line != expected_line {
            return Some(format!(
                "expected error on line {}, but span is on line {}",
                expected_line, actual_line
            ));
        }
    }

    None
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Discover `.test.xml` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
/// Returns a BTreeMap so categories are sorted alphabetically.
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    // Sort files within each category
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(TEST_SUFFIX) {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

/// Run all `.test.xml` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(
    path: &Path,
    registry: &Registry,
    parser_config: &ParserConfig,
    no_color: bool,
    categories: &[String],
) -> i32 {
    // Single file mode — ignore categories
    if path.is_file() {
        let result = run_single_test(path, registry, parser_config);
        let label = result
            .description
            .as_deref()
            .unwrap_or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("?")
            });
        return match &result.outcome {
            TestOutcome::Pass => {
                eprintln!("  {}  {}", pass_label(no_color), label);
                eprintln!();
                eprintln!("test result: {}. 1 passed, 0 failed", if no_color { "ok" } else { "\x1b[32mok\x1b[0m" });
                0
            }
            TestOutcome::Fail(reason) => {
                eprintln!("  {}  {}", fail_label(no_color), label);
                eprintln!();
                eprintln!("failures:");
                eprintln!();
                eprintln!("  --- {} ---", path.display());
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
                eprintln!();
                eprintln!("test result: {}. 0 passed, 1 failed (of 1)",
                    if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" });
                1
            }
        };
    }

    let all_categories = discover_categorized(path);

    if all_categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return 1;
    }

    // Filter categories if specified
    let run_categories: BTreeMap<&str, &Vec<PathBuf>> = if categories.is_empty() {
        all_categories.iter().map(|(k, v)| (k.as_str(), v)).collect()
    } else {
        let mut filtered = BTreeMap::new();
        for requested in categories {
            let req = requested.trim_matches('/');
            let mut found = false;
            for (cat, files) in &all_categories {
                if cat == req || cat.starts_with(&format!("{}/", req)) {
                    filtered.insert(cat.as_str(), files);
                    found = true;
                }
            }
            if !found {
                eprintln!(
                    "warning: category '{}' not found (available: {})",
                    req,
                    all_categories
                        .keys()
                        .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
        filtered
    };

    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        // Print category header
        let header = if cat.is_empty() {
            "(root)".to_string()
        } else {
            cat.to_string()
        };
        eprintln!();
        eprintln!("{}", bold(&header, no_color));

        for file in *files {
            let result = run_single_test(file, registry, parser_config);
            let label = result
                .description
                .as_deref()
                .unwrap_or_else(|| {
                    file.file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("?")
                });

            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", pass_label(no_color), label);
                }
                TestOutcome::Fail(_) => {
                    failed += 1;
                    eprintln!("  {}  {}", fail_label(no_color), label);
                    failures.push(result);
                }
            }
        }
    }

    // Print failure details
    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    // Summary
    eprintln!();
    if failed == 0 {
        if no_color {
            eprintln!("test result: ok. {} passed, 0 failed", passed);
        } else {
            eprintln!("test result: \x1b[32mok\x1b[0m. {} passed, 0 failed", passed);
        }
        0
    } else {
        let total = passed + failed;
        if no_color {
            eprintln!(
                "test result: FAILED. {} passed, {} failed (of {})",
                passed, failed, total
            );
        } else {
            eprintln!(
                "test result: \x1b[31mFAILED\x1b[0m. {} passed, {} failed (of {})",
                passed, failed, total
            );
        }
        1
    }
}
