//! `unitreg check` - load every discovered unit and report failures.

use anyhow::bail;

use crate::commands::list::sorted_identifiers;
use crate::config_bridge::DescriptorNamespace;
use crate::theme::Theme;

/// A unit that failed to load.
#[derive(Debug)]
pub(crate) struct Failure {
    pub(crate) id: String,
    pub(crate) code: &'static str,
    pub(crate) message: String,
}

/// Outcome of loading every unit in a namespace.
#[derive(Debug, Default)]
pub(crate) struct CheckReport {
    pub(crate) loaded: Vec<String>,
    pub(crate) failures: Vec<Failure>,
}

pub(crate) fn check_namespace(ns: &DescriptorNamespace) -> anyhow::Result<CheckReport> {
    let mut report = CheckReport::default();
    for id in sorted_identifiers(ns)? {
        match ns.load(&id) {
            Ok(_) => report.loaded.push(id),
            Err(e) => {
                let code = e.not_found_cause().map_or("unit-error", |c| c.code());
                report.failures.push(Failure {
                    id,
                    code,
                    message: e.to_string(),
                });
            },
        }
    }
    Ok(report)
}

pub(crate) fn run_check(ns: &DescriptorNamespace) -> anyhow::Result<()> {
    let report = check_namespace(ns)?;

    println!("{}", Theme::heading(&format!("Checking '{}'", ns.name())));
    for id in &report.loaded {
        println!("  {}", Theme::loaded(id));
    }
    for failure in &report.failures {
        println!("  {}", Theme::failed(&failure.id, failure.code));
        println!("      {}", Theme::muted(&failure.message));
    }
    println!(
        "\n{}",
        Theme::muted(&format!(
            "{} loaded, {} failed",
            report.loaded.len(),
            report.failures.len()
        ))
    );

    if !report.failures.is_empty() {
        bail!(
            "{} unit(s) in '{}' failed to load",
            report.failures.len(),
            ns.name()
        );
    }
    Ok(())
}
