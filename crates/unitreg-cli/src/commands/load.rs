//! `unitreg load` - load a unit and show what it registered.

use anyhow::Context;
use unitreg_core::{NotFoundCause, RegistryError, UnitDescriptor};

use crate::config_bridge::DescriptorNamespace;
use crate::theme::Theme;

pub(crate) fn load_unit(ns: &DescriptorNamespace, id: &str, json: bool) -> anyhow::Result<()> {
    let descriptor = ns.load(id).map_err(with_hint)?;

    if json {
        println!("{}", render_json(&descriptor)?);
        return Ok(());
    }

    print_descriptor(&descriptor);
    match ns.path_for(id)? {
        Some(path) => println!("{}", Theme::field("path", path.display())),
        None => println!(
            "{}",
            Theme::field("path", Theme::muted("(registered by another unit)"))
        ),
    }
    Ok(())
}

fn render_json(descriptor: &UnitDescriptor) -> anyhow::Result<String> {
    serde_json::to_string_pretty(descriptor).context("serialize unit descriptor")
}

fn print_descriptor(descriptor: &UnitDescriptor) {
    println!("{}", Theme::heading(&descriptor.id));
    println!("{}", Theme::field("kind", &descriptor.kind));
    if let Some(name) = &descriptor.name {
        println!("{}", Theme::field("name", name));
    }
    if let Some(description) = &descriptor.description {
        println!("{}", Theme::field("description", description));
    }
    for (key, value) in &descriptor.metadata {
        println!("{}", Theme::field("metadata", format!("{key} = {value}")));
    }
}

/// Attach a remedy to the class-not-found causes a unit author can fix.
fn with_hint(err: RegistryError) -> anyhow::Error {
    let hint = match err.not_found_cause() {
        Some(NotFoundCause::NoSelfRegistration { .. }) => {
            Some("add a [[register]] table whose id matches the file name")
        },
        Some(NotFoundCause::IdMismatch { .. }) => {
            Some("rename the file or change the id in its [[register]] table")
        },
        _ => None,
    };
    match hint {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => err.into(),
    }
}
