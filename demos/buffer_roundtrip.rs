//! Build a document in memory and read it back as element events
//!
//! Run with: cargo run --example buffer_roundtrip

use xmlstream::{parse_buffer, Attribute, ElementHandler, Result, XmlWriter};

struct Printer;

impl ElementHandler for Printer {
    fn start(&mut self, line: u64, name: &str, attributes: &[Attribute]) -> Result<()> {
        let attrs: Vec<String> = attributes.iter().map(|a| a.to_string()).collect();
        println!("{:>3}: <{}> {}", line, name, attrs.join(" "));
        Ok(())
    }

    fn end(&mut self, line: u64, name: &str, content: &str) -> Result<()> {
        println!("{:>3}: </{}> {:?}", line, name, content);
        Ok(())
    }
}

fn main() -> Result<()> {
    let mut writer = XmlWriter::in_memory();
    writer.open_element("config")?;
    writer.attribute("version", "2")?;
    writer.open_element("server")?;
    writer.attribute("host", "localhost")?;
    writer.attribute_int("port", 8080)?;
    writer.close_element()?;
    writer.open_element("motd")?;
    writer.content_fmt(format_args!("Welcome, {} users online", 42))?;
    writer.close_element()?;
    writer.close_element()?;

    let xml = writer.into_buffer().unwrap_or_default();
    println!("{}\n", String::from_utf8_lossy(&xml));

    parse_buffer(&xml, &mut Printer)
}
