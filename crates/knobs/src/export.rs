//! Exporters rendering resolved terms into build-system fragments.

use std::io::Write;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::environment::ConfigEnvironment;
use crate::errors::KnobsResult;
use crate::value::Value;

static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

const SYMBOL_PREFIX: &str = "CONFIG_";

/// One output dialect: renders a single line per term from its exported
/// symbol, resolved value, and effective enablement.
pub trait ExportFormat {
    fn render(&self, symbol: &str, value: Option<&Value>, enabled: bool) -> String;
}

pub fn export_symbol(name: &str) -> String {
    format!("{SYMBOL_PREFIX}{}", name.to_uppercase())
}

pub fn export<W: Write>(
    env: &ConfigEnvironment,
    format: &dyn ExportFormat,
    out: &mut W,
) -> KnobsResult<()> {
    for node in env.terms() {
        let symbol = export_symbol(node.name());
        let line = format.render(&symbol, node.value().as_ref(), node.enabled());
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// `NAME := value` lines for inclusion from make.
pub struct MakefileFragment;

impl ExportFormat for MakefileFragment {
    fn render(&self, symbol: &str, value: Option<&Value>, enabled: bool) -> String {
        match value {
            _ if !enabled => format!("# {symbol} is disabled"),
            Some(Value::Bool(false)) => format!("# {symbol} is disabled"),
            Some(Value::Bool(true)) => format!("{symbol} := y"),
            Some(Value::Int(i)) => format!("{symbol} := {i}"),
            Some(Value::Str(s)) => format!("{symbol} := {s}"),
            None => format!("# {symbol} is not set"),
        }
    }
}

/// `#define NAME value` lines for inclusion from C.
pub struct CHeader;

impl ExportFormat for CHeader {
    fn render(&self, symbol: &str, value: Option<&Value>, enabled: bool) -> String {
        match value {
            _ if !enabled => format!("// {symbol} is disabled"),
            Some(Value::Bool(false)) => format!("// {symbol} is disabled"),
            Some(Value::Bool(true)) => format!("#define {symbol}"),
            Some(Value::Int(i)) => format!("#define {symbol} {i}"),
            Some(Value::Str(s)) => {
                // Identifier-shaped strings fold into the symbol itself, so
                // `isa = "x86_64"` can be probed as CONFIG_ISA_X86_64.
                if IDENTIFIER_REGEX.is_match(s) {
                    format!("#define {symbol}_{}", s.to_uppercase())
                } else {
                    format!("#define {symbol} {s:?}")
                }
            }
            None => format!("// {symbol} is not set"),
        }
    }
}
