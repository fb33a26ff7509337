//! CRD YAML Generator
//!
//! This binary generates the Kubernetes CRD manifest for the Reaper
//! custom resource.
//!
//! Usage: cargo run --bin crdgen > config/crd/reapers.yaml

use kubescrub_operator::crd::generate_crds;

fn main() -> anyhow::Result<()> {
    for crd in generate_crds()? {
        println!("---");
        print!("{}", crd);
    }
    Ok(())
}
