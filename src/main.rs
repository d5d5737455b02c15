use anyhow::Result;

fn main() -> Result<()> {
    sandmatrix::app::run()
}
