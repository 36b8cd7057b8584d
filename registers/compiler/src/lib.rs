// Licensed under the Apache-2.0 license

//! Register-map compiler.
//!
//! Reads a register map (registers, bit fields, access modes and behavioral
//! modifiers) from JSON or TOML, resolves register addresses, and generates
//! a Verilog Local Bus bridge for one bus protocol plus Markdown
//! documentation.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use regmap_compiler::{
//!     generate_bridge, generate_docs, read_configuration, read_register_map, OsFileSystem,
//! };
//!
//! let fs = OsFileSystem;
//! let config = read_configuration(&fs, Path::new("config.toml")).unwrap();
//! let input = Path::new("regs.toml");
//! let rmap = read_register_map(&fs, input, config).unwrap();
//!
//! // Writes out/apb2lb_regs.v when lb_bridge.type = "apb".
//! generate_bridge(&fs, &rmap, Path::new("out"), Some(input)).unwrap();
//! generate_docs(&fs, &rmap, Path::new("out"), Some(input)).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`model`]: [`RegisterMap`], [`Register`], [`BitField`] and their invariants
//! - [`config`]: Generation options ([`Configuration`])
//! - [`codec`]: JSON/TOML documents for maps and configurations
//! - [`layout`]: Address resolution
//! - [`bridge`]: Verilog bridge generation and its cycle model
//! - [`docs`]: Markdown documentation
//! - [`fs`]: File-system collaborator
//! - [`util`]: Identifier checks and hex formatting

pub mod bridge;
pub mod codec;
pub mod config;
pub mod docs;
pub mod error;
pub mod fs;
pub mod layout;
pub mod model;
pub mod util;

mod compile;

// Re-export main public API
pub use compile::{
    generate_bridge, generate_docs, output_name, read_configuration, read_register_map,
    write_configuration, write_configuration_template, write_register_map,
    write_register_map_template,
};
pub use config::Configuration;
pub use error::{Error, Result};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use model::{Access, BitField, Modifier, Register, RegisterMap};
