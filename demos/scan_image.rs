use std::error::Error;

use qrism_studio::scanner::TerminalFeedback;
use qrism_studio::storage::MemoryStore;
use qrism_studio::{Profile, Scanner};

fn main() -> Result<(), Box<dyn Error>> {
    // Read an image path from the command line, e.g. one written by the basic_generation demo
    let path = std::env::args().nth(1).unwrap_or_else(|| "./qrcode.png".to_string());

    let mut profile = Profile::open(MemoryStore::new())?;
    let mut scanner = Scanner::default();

    match scanner.scan_file(path.as_ref(), &mut profile, &mut TerminalFeedback) {
        Ok(res) => {
            println!("Decoded message: {}", res.content);
            println!("Category: {}", res.category);
            if let Some(ec) = res.ec_level {
                println!("Error correction: {}", ec.label());
            }
        }
        Err(e) => println!("{e}: {path}"),
    }
    Ok(())
}
