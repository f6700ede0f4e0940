use anyhow::Result;

fn main() -> Result<()> {
    dvln_cli::main_entry()
}
