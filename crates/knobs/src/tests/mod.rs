use crate::builder::NodeBuilder;
use crate::environment::ConfigEnvironment;

mod cycles;
mod refresh;
mod snapshots;

pub(crate) fn build(source: &str) -> ConfigEnvironment {
    let env = ConfigEnvironment::new();
    NodeBuilder::build_source(&env, "test.knob", source).unwrap();
    env
}

pub(crate) fn build_err(source: &str) -> anyhow::Error {
    let env = ConfigEnvironment::new();
    NodeBuilder::build_source(&env, "test.knob", source).unwrap_err()
}
