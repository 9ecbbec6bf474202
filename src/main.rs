use anyhow::Result;

fn main() -> Result<()> {
    stockpile::cli::run()?;
    Ok(())
}
