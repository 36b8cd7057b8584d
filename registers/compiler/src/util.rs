// Licensed under the Apache-2.0 license

//! Utility functions for name conversion and formatting.
//!
//! This module provides the identifier checks shared by the model, the
//! naming conventions applied to generated signal names, and helpers that
//! format values as Verilog literals or human-readable hex constants.

/// Returns true if `name` is a plain identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Converts a name to snake_case.
///
/// Handles various edge cases:
/// - Leading digits get underscore prefix
/// - Punctuation and whitespace become underscores
/// - CamelCase transitions get underscore separators
///
/// # Examples
/// ```
/// use regmap_compiler::util::snake_case;
/// assert_eq!(snake_case("MyRegister"), "my_register");
/// assert_eq!(snake_case("IRQ_Status"), "irq_status");
/// ```
pub fn snake_case(name: &str) -> String {
    let mut result = String::new();
    if let Some(c) = name.chars().next() {
        if c.is_ascii_digit() {
            result.push('_');
        }
    }
    let mut prev = None;
    for c in name.chars() {
        if c.is_ascii_whitespace() || c.is_ascii_punctuation() {
            if prev != Some('_') {
                result.push('_');
            }
            prev = Some('_');
            continue;
        }
        if let Some(prev) = prev {
            if (prev.is_ascii_lowercase() || prev.is_ascii_digit()) && c.is_ascii_uppercase() {
                result.push('_');
            }
        }
        prev = Some(c);
        result.push(c.to_ascii_lowercase());
    }
    result.replace("__", "_")
}

/// Returns true for reserved words of Verilog-2005.
pub fn is_verilog_keyword(s: &str) -> bool {
    matches!(
        s,
        "always"
            | "and"
            | "assign"
            | "begin"
            | "buf"
            | "case"
            | "casex"
            | "casez"
            | "default"
            | "else"
            | "end"
            | "endcase"
            | "endfunction"
            | "endgenerate"
            | "endmodule"
            | "for"
            | "function"
            | "generate"
            | "genvar"
            | "if"
            | "initial"
            | "inout"
            | "input"
            | "integer"
            | "localparam"
            | "module"
            | "nand"
            | "negedge"
            | "nor"
            | "not"
            | "or"
            | "output"
            | "parameter"
            | "posedge"
            | "reg"
            | "signed"
            | "task"
            | "wire"
            | "xor"
    )
}

/// Formats an integer as a hex constant with underscores for readability.
///
/// Values <= 9 are formatted as decimal; larger values use hex with
/// underscore separators every 4 digits.
///
/// # Examples
/// ```
/// use regmap_compiler::util::hex_const;
/// assert_eq!(hex_const(5), "5");
/// assert_eq!(hex_const(0x1234), "0x1234");
/// assert_eq!(hex_const(0x12345678), "0x1234_5678");
/// ```
pub fn hex_const(val: u64) -> String {
    if val > 9 {
        format!("0x{}", group_hex_digits(&format!("{val:x}")))
    } else {
        format!("{val}")
    }
}

/// Formats an address as a zero-padded hex constant sized for `address_width`.
///
/// ```
/// use regmap_compiler::util::hex_addr;
/// assert_eq!(hex_addr(4, 16), "0x0004");
/// assert_eq!(hex_addr(0x1000_0000, 32), "0x1000_0000");
/// ```
pub fn hex_addr(val: u64, address_width: u32) -> String {
    let digits = (address_width as usize).div_ceil(4).max(1);
    format!("0x{}", group_hex_digits(&format!("{val:0digits$x}")))
}

/// Formats a sized Verilog hex literal, e.g. `16'h0004`.
///
/// ```
/// use regmap_compiler::util::verilog_hex;
/// assert_eq!(verilog_hex(16, 4), "16'h0004");
/// assert_eq!(verilog_hex(32, 0x2a), "32'h0000_002a");
/// ```
pub fn verilog_hex(width: u32, val: u64) -> String {
    let digits = (width as usize).div_ceil(4).max(1);
    format!("{width}'h{}", group_hex_digits(&format!("{val:0digits$x}")))
}

/// Returns a mask with the low `width` bits set.
pub fn bit_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn group_hex_digits(digits: &str) -> String {
    let mut x = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i % 4 == 0 && i != 0 {
            x.push('_');
        }
        x.push(c);
    }
    x.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("spam"));
        assert!(is_identifier("_reserved0"));
        assert!(is_identifier("IRQ_STATUS2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("with space"));
        assert!(!is_identifier("dash-ed"));
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("MyRegister"), "my_register");
        assert_eq!(snake_case("irq Status"), "irq_status");
        // All-uppercase sequences stay lowercase without separators
        assert_eq!(snake_case("HTTPServer"), "httpserver");
        assert_eq!(snake_case("9lives"), "_9lives");
    }

    #[test]
    fn test_hex_const() {
        assert_eq!(hex_const(0), "0");
        assert_eq!(hex_const(9), "9");
        assert_eq!(hex_const(10), "0xa");
        assert_eq!(hex_const(0x1234), "0x1234");
        assert_eq!(hex_const(0x12345678), "0x1234_5678");
    }

    #[test]
    fn test_verilog_hex() {
        assert_eq!(verilog_hex(1, 1), "1'h1");
        assert_eq!(verilog_hex(7, 42), "7'h2a");
        assert_eq!(verilog_hex(64, 0), "64'h0000_0000_0000_0000");
    }

    #[test]
    fn test_bit_mask() {
        assert_eq!(bit_mask(1), 1);
        assert_eq!(bit_mask(7), 0x7f);
        assert_eq!(bit_mask(64), u64::MAX);
    }

    #[test]
    fn test_verilog_keywords() {
        assert!(is_verilog_keyword("reg"));
        assert!(is_verilog_keyword("module"));
        assert!(!is_verilog_keyword("spam"));
    }
}
