//! Persisted snapshot: a flat name -> resolved-value mapping over terms.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use knobs_syntax::SourceLocation;

use crate::environment::ConfigEnvironment;
use crate::errors::KnobsResult;
use crate::value::Value;

/// Capture every resolved term value.
pub fn snapshot(env: &ConfigEnvironment) -> IndexMap<String, Value> {
    env.terms()
        .into_iter()
        .filter_map(|node| node.value().map(|v| (node.name().to_string(), v)))
        .collect()
}

pub fn save_snapshot(env: &ConfigEnvironment, path: impl AsRef<Path>) -> KnobsResult<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("unable to create snapshot {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &snapshot(env))
        .with_context(|| format!("unable to serialize snapshot {}", path.display()))?;
    Ok(())
}

/// Restore saved values, then run one refresh. Unknown names are skipped
/// with a warning; read-only terms take their values back from their
/// bodies during the refresh regardless of what the snapshot says.
pub fn restore(env: &ConfigEnvironment, values: &IndexMap<String, Value>) -> KnobsResult<()> {
    for (name, value) in values {
        match env.get_node(name) {
            Some(node) => node.set_value_raw(Some(value.clone())),
            None => env.diagnostics_sink().warn(
                SourceLocation::unknown(),
                name.clone(),
                "missing node, skipped",
            ),
        }
    }

    env.refresh()
}

pub fn load_snapshot(env: &ConfigEnvironment, path: impl AsRef<Path>) -> KnobsResult<()> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("unable to open snapshot {}", path.display()))?;
    let values: IndexMap<String, Value> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("unable to parse snapshot {}", path.display()))?;
    restore(env, &values)
}
