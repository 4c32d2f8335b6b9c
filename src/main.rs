fn main() -> anyhow::Result<()> {
    terraseq::cli::run()
}
