//! `unitreg list` - identifiers discovered on disk.

use crate::config_bridge::DescriptorNamespace;
use crate::theme::Theme;

/// Discovered identifiers, sorted for display.
pub(crate) fn sorted_identifiers(ns: &DescriptorNamespace) -> anyhow::Result<Vec<String>> {
    let mut ids: Vec<String> = ns.list_identifiers()?.collect();
    ids.sort();
    Ok(ids)
}

pub(crate) fn list_units(ns: &DescriptorNamespace) -> anyhow::Result<()> {
    let ids = sorted_identifiers(ns)?;
    if ids.is_empty() {
        println!(
            "{}",
            Theme::note(&format!("No units found in namespace '{}'", ns.name()))
        );
        return Ok(());
    }

    println!("{}", Theme::heading(&format!("Units in '{}'", ns.name())));
    for id in &ids {
        println!("  {id}");
    }
    println!("\n{}", Theme::muted(&format!("{} unit(s)", ids.len())));
    Ok(())
}
