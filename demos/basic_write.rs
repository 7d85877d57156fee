//! Write an XML file atomically
//!
//! Run with: cargo run --example basic_write

use xmlstream::XmlWriter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = "basic_write.xml";

    let mut writer = XmlWriter::new(path)?;
    writer.open_element("employees")?;
    writer.attribute("company", "Smith & Sons")?;

    for (id, name, city) in [(1, "Alice", "New York"), (2, "Bob", "Hà Nội")] {
        writer.open_element("employee")?;
        writer.attribute_int("id", id)?;
        writer.attribute("city", city)?;
        writer.content(name)?;
        writer.close_element()?;
    }

    writer.close_element()?;
    writer.finalize()?;

    println!("✅ Wrote {} ({} bytes)", path, std::fs::metadata(path)?.len());
    println!("{}", std::fs::read_to_string(path)?);
    Ok(())
}
