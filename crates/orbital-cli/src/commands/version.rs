use crate::output::OutputWriter;
use crate::output_types::VersionOutput;
use anyhow::Result;

pub fn execute(output: &OutputWriter) -> Result<()> {
    let version = VersionOutput { name: "orbital-eye", version: env!("CARGO_PKG_VERSION") };

    if output.is_json() {
        return output.result(version);
    }

    println!("{} {}", version.name, version.version);
    Ok(())
}
