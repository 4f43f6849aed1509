fn main() -> anyhow::Result<()> {
    packsmith::cli::run_cli()
}
