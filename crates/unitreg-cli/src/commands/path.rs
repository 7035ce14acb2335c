//! `unitreg path` - locate a unit file without loading it.

use anyhow::bail;

use crate::config_bridge::DescriptorNamespace;

pub(crate) fn show_path(ns: &DescriptorNamespace, id: &str) -> anyhow::Result<()> {
    match ns.path_for(id)? {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        },
        None => bail!("no unit file for '{id}' in namespace '{}'", ns.name()),
    }
}
