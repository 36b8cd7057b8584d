// Licensed under the Apache-2.0 license

//! File-level operations: read and write documents, emit generated outputs.

use crate::bridge::protocol::lookup;
use crate::bridge::render_bridge;
use crate::codec::{
    dump_configuration, dump_register_map, parse_configuration, parse_register_map, Format,
};
use crate::config::Configuration;
use crate::docs::render_docs;
use crate::error::{config_err, Result};
use crate::fs::FileSystem;
use crate::layout::resolve;
use crate::model::RegisterMap;
use std::path::{Path, PathBuf};

/// Read a register map document; the format follows the file extension.
pub fn read_register_map(
    fs: &dyn FileSystem,
    path: &Path,
    config: Configuration,
) -> Result<RegisterMap> {
    let format = Format::from_path(path)?;
    let text = fs.read_to_string(path)?;
    let rmap = parse_register_map(&text, format, &path.display().to_string(), config)?;
    log::debug!("read {} registers from {}", rmap.len(), path.display());
    Ok(rmap)
}

pub fn write_register_map(fs: &dyn FileSystem, path: &Path, rmap: &RegisterMap) -> Result<()> {
    let text = dump_register_map(rmap, Format::from_path(path)?)?;
    fs.write(path, &text)?;
    log::info!("wrote register map {}", path.display());
    Ok(())
}

/// Read a configuration document; options it omits keep their defaults.
pub fn read_configuration(fs: &dyn FileSystem, path: &Path) -> Result<Configuration> {
    let format = Format::from_path(path)?;
    let text = fs.read_to_string(path)?;
    parse_configuration(&text, format, &path.display().to_string())
}

pub fn write_configuration(fs: &dyn FileSystem, path: &Path, config: &Configuration) -> Result<()> {
    let text = dump_configuration(config, Format::from_path(path)?)?;
    fs.write(path, &text)?;
    log::info!("wrote configuration {}", path.display());
    Ok(())
}

/// Write the two-register starter map (`spam` and `eggs`).
pub fn write_register_map_template(
    fs: &dyn FileSystem,
    path: &Path,
    config: Configuration,
) -> Result<()> {
    write_register_map(fs, path, &RegisterMap::template(config)?)
}

/// Write a configuration holding every documented default.
pub fn write_configuration_template(fs: &dyn FileSystem, path: &Path) -> Result<()> {
    write_configuration(fs, path, &Configuration::new())
}

/// Base name of generated outputs: the configured `name`, else the stem of
/// the register map document.
pub fn output_name(config: &Configuration, input_path: Option<&Path>) -> Result<String> {
    if let Some(name) = config.name() {
        return Ok(name.to_string());
    }
    match input_path.and_then(Path::file_stem) {
        Some(stem) => Ok(stem.to_string_lossy().into_owned()),
        None => config_err!("no output name: set the 'name' option or read the map from a file"),
    }
}

/// Resolve `rmap` and write its bridge into `out_dir`.
///
/// Returns the written path, or `None` without touching the file system when
/// `lb_bridge.type` is `none`.
pub fn generate_bridge(
    fs: &dyn FileSystem,
    rmap: &RegisterMap,
    out_dir: &Path,
    input_path: Option<&Path>,
) -> Result<Option<PathBuf>> {
    let resolved = resolve(rmap)?;
    if lookup(rmap.config().lb_bridge_type())?.is_none() {
        log::info!("lb_bridge.type is 'none', skipping bridge generation");
        return Ok(None);
    }
    let mapname = output_name(rmap.config(), input_path)?;
    let Some(bridge) = render_bridge(&resolved, &mapname)? else {
        return Ok(None);
    };
    let path = out_dir.join(&bridge.file_name);
    fs.write(&path, &bridge.text)?;
    log::info!("wrote {} bridge {}", bridge.protocol.title, path.display());
    Ok(Some(path))
}

/// Resolve `rmap` and write its Markdown reference into `out_dir`.
pub fn generate_docs(
    fs: &dyn FileSystem,
    rmap: &RegisterMap,
    out_dir: &Path,
    input_path: Option<&Path>,
) -> Result<PathBuf> {
    let resolved = resolve(rmap)?;
    let mapname = output_name(rmap.config(), input_path)?;
    let text = render_docs(&resolved, &mapname)?;
    let path = out_dir.join(format!("{mapname}.md"));
    fs.write(&path, &text)?;
    log::info!("wrote documentation {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    #[test]
    fn test_output_name() {
        let config = Configuration::new();
        let input = Path::new("maps/soc_regs.toml");
        assert_eq!(output_name(&config, Some(input)).unwrap(), "soc_regs");
        assert!(output_name(&config, None).unwrap_err().is_config());

        let config = config.with("name", "ctrl").unwrap();
        assert_eq!(output_name(&config, Some(input)).unwrap(), "ctrl");
        assert_eq!(output_name(&config, None).unwrap(), "ctrl");
    }

    #[test]
    fn test_unknown_extension() {
        let fs = MemoryFileSystem::new().with_file("map.yaml", "regmap: []");
        let err = read_register_map(&fs, Path::new("map.yaml"), Configuration::new()).unwrap_err();
        assert!(err.is_config());
        let err = write_configuration_template(&fs, Path::new("config.ini")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_missing_file() {
        let fs = MemoryFileSystem::new();
        let err = read_configuration(&fs, Path::new("config.toml")).unwrap_err();
        assert!(matches!(err, crate::Error::Io { .. }));
    }

    #[test]
    fn test_bridge_needs_identifier_name() {
        let config = Configuration::new().with("lb_bridge.type", "amm").unwrap();
        let rmap = RegisterMap::template(config).unwrap();
        let fs = MemoryFileSystem::new();
        let input = Path::new("my-regs.json");
        let err = generate_bridge(&fs, &rmap, Path::new("out"), Some(input)).unwrap_err();
        assert!(err.is_config());
        assert!(fs.paths().is_empty());
        // Docs have no such restriction.
        let path = generate_docs(&fs, &rmap, Path::new("out"), Some(input)).unwrap();
        assert_eq!(path, Path::new("out/my-regs.md"));
    }
}
