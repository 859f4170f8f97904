//! Object, material and asset-file naming.

/// Object name for the `o`/`newmtl` directives: spaces become underscores.
pub fn object_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// File stem of an asset in the content tree (`art objects/`,
/// `background planes/`): lower-cased, spaces become underscores.
pub fn asset_stem(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Name of a homogeneous instance, made unique by the global vertex offset
/// observed when its fragment was built.
pub fn instance_name(base: &str, offset: u32) -> String {
    format!("{}-{}", object_name(base), offset)
}
