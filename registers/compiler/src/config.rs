// Licensed under the Apache-2.0 license

//! Generation options.
//!
//! A [`Configuration`] is a flat namespace of typed options. Every option is
//! described by an [`OptionSpec`] in the [`OPTIONS`] table, which carries the
//! value kind, the documented default and a one-line description. Values are
//! validated when they are set, so the typed getters never fail.
//!
//! # Example
//!
//! ```
//! use regmap_compiler::config::Configuration;
//!
//! let mut config = Configuration::new();
//! assert_eq!(config.data_width(), 32);
//! assert_eq!(config.address_increment(), 4);
//!
//! config.set("data_width", 16).unwrap();
//! config.set("lb_bridge.type", "apb").unwrap();
//! assert_eq!(config.address_increment(), 2);
//! assert_eq!(config.lb_bridge_type(), "apb");
//!
//! assert!(config.set("lb_bridge.type", "pcie").unwrap_err().is_config());
//! assert!(config.set("no_such_option", 1).unwrap_err().is_schema());
//! ```

use crate::error::{config_err, Error, Result};
use crate::util::{bit_mask, is_identifier, snake_case};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A typed option value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OptionValue {
    Int(u64),
    Str(String),
    /// A negative literal; no option accepts one.
    Negative(i64),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(v) => write!(f, "{v}"),
            OptionValue::Str(s) => write!(f, "{s}"),
            OptionValue::Negative(v) => write!(f, "{v}"),
        }
    }
}

impl From<u64> for OptionValue {
    fn from(val: u64) -> Self {
        OptionValue::Int(val)
    }
}
impl From<u32> for OptionValue {
    fn from(val: u32) -> Self {
        OptionValue::Int(val.into())
    }
}
impl From<i32> for OptionValue {
    fn from(val: i32) -> Self {
        match u64::try_from(val) {
            Ok(v) => OptionValue::Int(v),
            Err(_) => OptionValue::Negative(val.into()),
        }
    }
}
impl From<&str> for OptionValue {
    fn from(val: &str) -> Self {
        OptionValue::Str(val.to_string())
    }
}
impl From<String> for OptionValue {
    fn from(val: String) -> Self {
        OptionValue::Str(val)
    }
}

/// The value domain of an option.
#[derive(Clone, Copy, Debug)]
pub enum OptionKind {
    /// A string that must be an identifier (or empty when allowed).
    Identifier { allow_empty: bool },
    /// One of a closed set of integers.
    IntChoice(&'static [u64]),
    /// An integer within an inclusive range.
    IntRange { min: u64, max: u64 },
    /// One of a closed set of strings.
    Choice(&'static [&'static str]),
    /// Either the keyword `data_width` or a power of two within 1..=4096.
    Increment,
}

/// Compile-time default of an option.
#[derive(Clone, Copy, Debug)]
pub enum OptionDefault {
    /// The option is optional and unset by default.
    Unset,
    Int(u64),
    Str(&'static str),
}

/// Description of a single recognized option.
#[derive(Clone, Copy, Debug)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: OptionDefault,
    pub doc: &'static str,
}

/// Supported Local Bus bridge families, plus the `none` sentinel.
pub const BRIDGE_TYPES: &[&str] = &["none", "apb", "axil", "amm"];

/// Every option recognized by [`Configuration`], in document order.
pub const OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "name",
        kind: OptionKind::Identifier { allow_empty: false },
        default: OptionDefault::Unset,
        doc: "Base name of generated files; defaults to the register map file name",
    },
    OptionSpec {
        name: "data_width",
        kind: OptionKind::IntChoice(&[8, 16, 32, 64]),
        default: OptionDefault::Int(32),
        doc: "Bus data width in bits",
    },
    OptionSpec {
        name: "address_width",
        kind: OptionKind::IntRange { min: 1, max: 32 },
        default: OptionDefault::Int(16),
        doc: "Bus address width in bits",
    },
    OptionSpec {
        name: "address_increment",
        kind: OptionKind::Increment,
        default: OptionDefault::Str("data_width"),
        doc: "Byte stride between registers; 'data_width' uses the bus width in bytes",
    },
    OptionSpec {
        name: "register_reset",
        kind: OptionKind::Choice(&["sync_pos", "sync_neg", "async_pos", "async_neg"]),
        default: OptionDefault::Str("sync_pos"),
        doc: "Reset style of generated flip-flops",
    },
    OptionSpec {
        name: "read_filler",
        kind: OptionKind::IntRange {
            min: 0,
            max: u64::MAX,
        },
        default: OptionDefault::Int(0),
        doc: "Value read from unmapped addresses and non-readable bits",
    },
    OptionSpec {
        name: "naming.prefix",
        kind: OptionKind::Identifier { allow_empty: true },
        default: OptionDefault::Str("csr_"),
        doc: "Prefix of hardware-side port names",
    },
    OptionSpec {
        name: "naming.case",
        kind: OptionKind::Choice(&["keep", "lower", "upper", "snake"]),
        default: OptionDefault::Str("lower"),
        doc: "Case convention of hardware-side port names",
    },
    OptionSpec {
        name: "lb_bridge.type",
        kind: OptionKind::Choice(BRIDGE_TYPES),
        default: OptionDefault::Str("none"),
        doc: "Bus protocol of the generated Local Bus bridge, or 'none'",
    },
];

/// Look up the description of an option.
pub fn option_spec(name: &str) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|spec| spec.name == name)
}

impl OptionSpec {
    fn default_value(&self) -> Option<OptionValue> {
        match self.default {
            OptionDefault::Unset => None,
            OptionDefault::Int(v) => Some(OptionValue::Int(v)),
            OptionDefault::Str(s) => Some(OptionValue::Str(s.to_string())),
        }
    }

    fn validate(&self, value: &OptionValue) -> Result<()> {
        let name = self.name;
        match (self.kind, value) {
            (OptionKind::Identifier { allow_empty }, OptionValue::Str(s)) => {
                if !(is_identifier(s) || (allow_empty && s.is_empty())) {
                    config_err!("option '{name}' must be an identifier, got '{s}'");
                }
            }
            (OptionKind::IntChoice(choices), OptionValue::Int(v)) => {
                if !choices.contains(v) {
                    config_err!("option '{name}' must be one of {choices:?}, got {v}");
                }
            }
            (OptionKind::IntRange { min, max }, OptionValue::Int(v)) => {
                if *v < min || *v > max {
                    config_err!("option '{name}' must be within {min}..={max}, got {v}");
                }
            }
            (OptionKind::Choice(choices), OptionValue::Str(s)) => {
                if !choices.contains(&s.as_str()) {
                    config_err!("option '{name}' must be one of {choices:?}, got '{s}'");
                }
            }
            (OptionKind::Increment, OptionValue::Str(s)) => {
                if s != "data_width" {
                    config_err!("option '{name}' must be 'data_width' or an integer, got '{s}'");
                }
            }
            (OptionKind::Increment, OptionValue::Int(v)) => {
                if !v.is_power_of_two() || *v > 4096 {
                    config_err!("option '{name}' must be a power of two up to 4096, got {v}");
                }
            }
            (_, OptionValue::Negative(v)) => {
                config_err!("option '{name}' must not be negative, got {v}");
            }
            (kind, value) => {
                config_err!("option '{name}' has the wrong type: expected {kind:?}, got {value:?}");
            }
        }
        Ok(())
    }
}

/// Reset style of the generated flip-flops.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResetStyle {
    SyncPos,
    SyncNeg,
    AsyncPos,
    AsyncNeg,
}

impl ResetStyle {
    /// Name of the reset port.
    pub fn port(self) -> &'static str {
        match self {
            ResetStyle::SyncPos | ResetStyle::AsyncPos => "rst",
            ResetStyle::SyncNeg | ResetStyle::AsyncNeg => "rst_n",
        }
    }

    /// Event control of a clocked `always` block.
    pub fn sensitivity(self) -> &'static str {
        match self {
            ResetStyle::SyncPos | ResetStyle::SyncNeg => "@(posedge clk)",
            ResetStyle::AsyncPos => "@(posedge clk or posedge rst)",
            ResetStyle::AsyncNeg => "@(posedge clk or negedge rst_n)",
        }
    }

    /// Condition under which the reset is active.
    pub fn active(self) -> &'static str {
        match self {
            ResetStyle::SyncPos | ResetStyle::AsyncPos => "rst",
            ResetStyle::SyncNeg | ResetStyle::AsyncNeg => "!rst_n",
        }
    }
}

impl FromStr for ResetStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "sync_pos" => ResetStyle::SyncPos,
            "sync_neg" => ResetStyle::SyncNeg,
            "async_pos" => ResetStyle::AsyncPos,
            "async_neg" => ResetStyle::AsyncNeg,
            _ => config_err!("unknown reset style '{s}'"),
        })
    }
}

/// Case convention applied to hardware-side port names.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NamingCase {
    Keep,
    Lower,
    Upper,
    Snake,
}

impl NamingCase {
    pub fn apply(self, name: &str) -> String {
        match self {
            NamingCase::Keep => name.to_string(),
            NamingCase::Lower => name.to_ascii_lowercase(),
            NamingCase::Upper => name.to_ascii_uppercase(),
            NamingCase::Snake => snake_case(name),
        }
    }
}

impl FromStr for NamingCase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "keep" => NamingCase::Keep,
            "lower" => NamingCase::Lower,
            "upper" => NamingCase::Upper,
            "snake" => NamingCase::Snake,
            _ => config_err!("unknown naming case '{s}'"),
        })
    }
}

/// A validated set of generation options.
///
/// Every option with a default is always present, so two configurations
/// compare equal exactly when their effective values agree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Configuration {
    values: BTreeMap<&'static str, OptionValue>,
}

impl Default for Configuration {
    fn default() -> Self {
        let values = OPTIONS
            .iter()
            .filter_map(|spec| spec.default_value().map(|v| (spec.name, v)))
            .collect();
        Self { values }
    }
}

impl Configuration {
    /// Create a configuration holding the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, validating the key and the value.
    ///
    /// Unknown keys fail with [`Error::Schema`]; values outside the option's
    /// domain fail with [`Error::Config`].
    pub fn set(&mut self, key: &str, value: impl Into<OptionValue>) -> Result<()> {
        let spec = option_spec(key)
            .ok_or_else(|| Error::schema(key, format!("unknown configuration option '{key}'")))?;
        let value = value.into();
        spec.validate(&value)?;
        self.values.insert(spec.name, value);
        Ok(())
    }

    /// Builder-style [`Configuration::set`].
    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Result<Self> {
        self.set(key, value)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    /// Returns true if the option currently has a value.
    pub fn is_set(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over the options that have a value, in [`OPTIONS`] order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &OptionValue)> + '_ {
        OPTIONS
            .iter()
            .filter_map(|spec| self.values.get(spec.name).map(|v| (spec.name, v)))
    }

    fn int(&self, key: &str) -> u64 {
        match self.values.get(key) {
            Some(OptionValue::Int(v)) => *v,
            _ => match option_spec(key).map(|spec| spec.default) {
                Some(OptionDefault::Int(v)) => v,
                _ => 0,
            },
        }
    }

    fn str(&self, key: &str) -> &str {
        match self.values.get(key) {
            Some(OptionValue::Str(s)) => s,
            _ => match option_spec(key).map(|spec| spec.default) {
                Some(OptionDefault::Str(s)) => s,
                _ => "",
            },
        }
    }

    /// Explicit base name of generated outputs, if configured.
    pub fn name(&self) -> Option<&str> {
        match self.values.get("name") {
            Some(OptionValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Bus data width in bits.
    pub fn data_width(&self) -> u32 {
        self.int("data_width") as u32
    }

    /// Bus data width in bytes.
    pub fn data_bytes(&self) -> u64 {
        u64::from(self.data_width() / 8)
    }

    pub fn address_width(&self) -> u32 {
        self.int("address_width") as u32
    }

    /// Byte stride between registers.
    pub fn address_increment(&self) -> u64 {
        match self.values.get("address_increment") {
            Some(OptionValue::Int(v)) => *v,
            _ => self.data_bytes(),
        }
    }

    pub fn register_reset(&self) -> ResetStyle {
        self.str("register_reset")
            .parse()
            .unwrap_or(ResetStyle::SyncPos)
    }

    /// Filler value, masked to the data width.
    pub fn read_filler(&self) -> u64 {
        self.int("read_filler") & bit_mask(self.data_width())
    }

    /// Filler value as configured, before masking.
    pub fn raw_read_filler(&self) -> u64 {
        self.int("read_filler")
    }

    pub fn naming_prefix(&self) -> &str {
        self.str("naming.prefix")
    }

    pub fn naming_case(&self) -> NamingCase {
        self.str("naming.case").parse().unwrap_or(NamingCase::Lower)
    }

    /// Requested bridge family (`none` means no bridge).
    pub fn lb_bridge_type(&self) -> &str {
        self.str("lb_bridge.type")
    }
}
