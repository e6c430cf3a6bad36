fn main() -> anyhow::Result<()> {
    avatar_studio::run()?;
    Ok(())
}
