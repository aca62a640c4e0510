use anyhow::Result;

fn main() -> Result<()> {
    sbstcmp::cli::cli()
}
