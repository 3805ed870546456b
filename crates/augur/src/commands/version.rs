pub fn run() -> anyhow::Result<()> {
    println!("augur {}", env!("CARGO_PKG_VERSION"));
    println!("Prediction extraction and theme clustering for discussion threads");
    Ok(())
}
