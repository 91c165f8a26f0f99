fn main() -> anyhow::Result<()> {
    portfolio_scene::flow::run()
}
