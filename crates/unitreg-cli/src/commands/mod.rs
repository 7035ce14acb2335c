pub(crate) mod check;
pub(crate) mod list;
pub(crate) mod load;
pub(crate) mod namespaces;
pub(crate) mod path;
