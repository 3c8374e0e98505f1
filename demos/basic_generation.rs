use std::error::Error;

use qrism_studio::storage::MemoryStore;
use qrism_studio::{ErrorCorrection, Generator, Profile};

fn main() -> Result<(), Box<dyn Error>> {
    let mut profile = Profile::open(MemoryStore::new())?;
    let mut generator = Generator::new(profile.settings());

    // Every edit with non-empty text records it in the history
    generator.apply_template("website", &mut profile)?;
    generator.set_ec_level(ErrorCorrection::H, &mut profile)?;
    generator.set_foreground("#1e3a8a", &mut profile)?;
    generator.set_size(384)?;

    print!("{}", generator.encode()?.to_terminal(false));
    generator.save("./qrcode.png".as_ref())?;

    let summary = generator.summary();
    println!("Saved qrcode.png ({}, {} chars)", summary.category, summary.chars);
    println!("History entries: {}", profile.history()?.len());
    Ok(())
}
