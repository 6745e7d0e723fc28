//! Check command - validate configuration, content and layouts

use std::{collections::HashSet, path::Path};

use color_eyre::eyre::{Result, bail};
use stencil_core::{Action, Config};
use stencil_generator::{ContentCollector, Layout, LayoutRegistry, load_layouts};

use super::load_config;

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Loads everything a build would and validates layout chains without
/// writing any output.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and content");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    match load_config(config_path) {
        Ok(config) => {
            println!("  ✓ Configuration valid");
            validate_site(&config, &mut result);
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e:#}"));
            println!("  ✗ Configuration invalid: {e:#}");
        }
    }

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Load content and layouts and cross-check them.
fn validate_site(config: &Config, result: &mut ValidationResult) {
    println!("\nChecking layouts...");
    let layouts = match load_layouts(&config.build.layouts_dir, &config.build.partials_dir) {
        Ok(layouts) => layouts,
        Err(e) => {
            result.add_error(format!("Layout error: {e}"));
            return;
        }
    };
    check_layouts(&layouts, result);

    if !config.build.content_dir.exists() {
        result.add_warning(format!(
            "Content directory {} does not exist",
            config.build.content_dir.display()
        ));
        return;
    }

    println!("\nChecking content...");
    let store = match ContentCollector::new(&config.build.content_dir)
        .with_drafts(config.build.drafts)
        .collect()
    {
        Ok(store) => store,
        Err(e) => {
            result.add_error(format!("Content error: {e}"));
            return;
        }
    };
    println!("  ✓ {} item(s) loaded", store.len());

    let mut used: HashSet<&str> = HashSet::new();
    for item in store.items().iter().filter(|i| i.action == Action::Render) {
        match layouts.chain(item.layout()) {
            Ok(chain) => used.extend(chain.into_iter().map(Layout::name)),
            Err(e) => result.add_error(format!(
                "{} ({}): {e}",
                item.title,
                item.file_path.display()
            )),
        }
    }

    for name in layouts.names() {
        if !used.contains(name) {
            result.add_warning(format!("Layout '{name}' is not used by any content"));
        }
    }
}

/// Every layout must reach a root through registered parents.
fn check_layouts(layouts: &LayoutRegistry, result: &mut ValidationResult) {
    if layouts.is_empty() {
        result.add_warning("No layouts found");
        return;
    }

    let mut valid = 0;
    for name in layouts.names() {
        match layouts.chain(name) {
            Ok(_) => valid += 1,
            Err(e) => result.add_error(format!("Layout '{name}': {e}")),
        }
    }
    println!("  ✓ {valid}/{} layout(s) valid", layouts.len());
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn check(root: &Path) -> ValidationResult {
        let config = Config::default().rooted_at(root);
        let mut result = ValidationResult::default();
        validate_site(&config, &mut result);
        result
    }

    #[test]
    fn test_valid_site() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layouts/default.hbs", "{{{content}}}");
        write(dir.path(), "content/index.md", "---\ntitle: Home\n---\nhi");

        let result = check(dir.path());
        assert!(!result.has_errors(), "{:?}", result.errors);
        assert!(!result.has_warnings(), "{:?}", result.warnings);
    }

    #[test]
    fn test_unknown_layout_is_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layouts/default.hbs", "{{{content}}}");
        write(
            dir.path(),
            "content/index.md",
            "---\ntitle: Home\nlayout: fancy\n---\nhi",
        );

        let result = check(dir.path());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("unknown layout: fancy"));
    }

    #[test]
    fn test_layout_cycle_is_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layouts/x.hbs", "---\nlayout: y\n---\n{{{content}}}");
        write(dir.path(), "layouts/y.hbs", "---\nlayout: x\n---\n{{{content}}}");

        let result = check(dir.path());
        assert!(result.errors.iter().any(|e| e.contains("layout cycle")));
    }

    #[test]
    fn test_unused_layout_is_warning() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layouts/default.hbs", "{{{content}}}");
        write(dir.path(), "layouts/legacy.hbs", "{{{content}}}");
        write(dir.path(), "content/index.md", "---\ntitle: Home\n---\nhi");

        let result = check(dir.path());
        assert!(!result.has_errors());
        assert_eq!(result.warnings, vec!["Layout 'legacy' is not used by any content"]);
    }

    #[test]
    fn test_strict_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "stencil.toml", "[site]\ntitle = \"T\"\n");
        write(dir.path(), "layouts/default.hbs", "{{{content}}}");

        let config_path = dir.path().join("stencil.toml");
        run(&config_path, false).unwrap();
        let err = run(&config_path, true).unwrap_err();
        assert!(err.to_string().contains("strict mode"));
    }
}
