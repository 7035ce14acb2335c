//! `unitreg namespaces` - show configured namespaces.

use crate::config_bridge::Catalog;
use crate::theme::Theme;

pub(crate) fn show_namespaces(catalog: &Catalog) {
    if catalog.is_empty() {
        println!("{}", Theme::note("No namespaces configured"));
        return;
    }

    println!("{}", Theme::heading("Namespaces"));
    println!("  {:<20} {:<8} DIRECTORY", "NAME", "EXT");
    println!("{}", Theme::rule());
    for (name, ns) in catalog.iter() {
        let directory = ns
            .directory()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|_| Theme::muted("(unset)"));
        println!("  {name:<20} {:<8} {directory}", ns.extension());
    }
}
