use cargo_toml::{Dependency, Manifest};

/// Version of the fjall engine this adapter is built against, as declared in
/// the adapter manifest.
pub(crate) fn fjall_version() -> Result<String, String> {
    dependency_version(include_str!("../Cargo.toml"), "fjall")
}

fn dependency_version(manifest: &str, name: &str) -> Result<String, String> {
    let manifest =
        Manifest::from_str(manifest).map_err(|e| format!("Failed to parse manifest: {}", e))?;

    match manifest.dependencies.get(name) {
        Some(Dependency::Simple(version)) => Ok(version.clone()),
        Some(Dependency::Detailed(detail)) => detail
            .version
            .clone()
            .ok_or_else(|| format!("{} dependency version not specified", name)),
        Some(Dependency::Inherited(_)) => {
            Err(format!("Inherited {} dependency not supported", name))
        }
        None => Err(format!("{} dependency not found", name)),
    }
}
