use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;
use xmlstream::{parse_buffer, Attribute, ElementHandler, XmlWriter, XmlWriterBuilder};

fn write_rows(writer: &mut XmlWriter<'_>, rows: usize) {
    writer.open_element("rows").unwrap();
    for i in 0..rows {
        writer.open_element("row").unwrap();
        writer.attribute_int("id", i as i64).unwrap();
        writer.attribute("name", &format!("Name_{} & co", i)).unwrap();
        writer.content(&(i * 100).to_string()).unwrap();
        writer.close_element().unwrap();
    }
    writer.close_element().unwrap();
}

fn benchmark_write_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_buffer");

    for size in [100, 1000, 10000, 100000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut writer = XmlWriter::in_memory();
                write_rows(&mut writer, size);
                black_box(writer.into_buffer().unwrap());
            });
        });
    }

    group.finish();
}

fn benchmark_write_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_file");
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.xml");

    for size in [1000, 10000, 100000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut writer = XmlWriterBuilder::new()
                    .sync_on_commit(false)
                    .to_file(&path)
                    .unwrap();
                write_rows(&mut writer, size);
                writer.finalize().unwrap();
            });
        });
    }

    group.finish();
}

struct Count(usize);

impl ElementHandler for Count {
    fn start(&mut self, _line: u64, _name: &str, _attrs: &[Attribute]) -> xmlstream::Result<()> {
        self.0 += 1;
        Ok(())
    }

    fn end(&mut self, _line: u64, _name: &str, content: &str) -> xmlstream::Result<()> {
        black_box(content);
        Ok(())
    }
}

fn benchmark_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");

    for size in [1000, 10000, 100000].iter() {
        let mut writer = XmlWriter::in_memory();
        write_rows(&mut writer, *size);
        let xml = writer.into_buffer().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut count = Count(0);
                parse_buffer(&xml, &mut count).unwrap();
                black_box(count.0);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_write_buffer,
    benchmark_write_file,
    benchmark_read
);
criterion_main!(benches);
