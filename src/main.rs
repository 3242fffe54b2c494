fn main() -> anyhow::Result<()> {
    outreach_lib::run()
}
