//! Library side of the `cloudgraph` binary: arguments, config file and
//! run wiring, kept out of `main.rs` so they can be tested.

mod app;
mod args;
mod config;

pub use app::{build_registry, build_store, orchestrator_config, run};
pub use args::Args;
pub use config::{
    CliConfig, CloudGraphSection, DGRAPH_HOST_ENV, ProviderSection, dgraph_host,
    resolve_dgraph_host,
};
