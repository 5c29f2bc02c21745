//! Benchmarks for excel2csv conversion performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks decode and serialize synthetic sheets of various sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use excel2csv::{CellFormatter, CsvOptions, DateSystem, FormatRule, GridSerializer, XlsxReader};
use std::io::Cursor;

/// Creates a synthetic XLSX workbook with `row_count` rows of mixed cells.
fn create_test_xlsx(row_count: usize) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));

    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    // [Content_Types].xml
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#,
    )
    .unwrap();

    // _rels/.rels
    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#,
    )
    .unwrap();

    zip.start_file("xl/workbook.xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="Data" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
    )
    .unwrap();

    zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
    )
    .unwrap();

    zip.start_file("xl/styles.xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14"/><xf numFmtId="4"/></cellXfs>
</styleSheet>"#,
    )
    .unwrap();

    // One shared string per row
    let mut strings = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    for i in 0..row_count {
        strings.push_str(&format!("<si><t>Item {}, with a comma</t></si>", i));
    }
    strings.push_str("</sst>");
    zip.start_file("xl/sharedStrings.xml", options).unwrap();
    zip.write_all(strings.as_bytes()).unwrap();

    // Generate sheet content, leaving every tenth row out
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>"#,
    );
    for i in (0..row_count).filter(|i| i % 10 != 9) {
        let r = i + 1;
        content.push_str(&format!(
            r#"<row r="{r}"><c r="A{r}" t="s"><v>{i}</v></c><c r="B{r}"><v>{i}.5</v></c><c r="C{r}" s="1"><v>{date}</v></c><c r="E{r}" s="2"><v>{money}</v></c><c r="F{r}" t="b"><v>1</v></c></row>"#,
            r = r,
            i = i,
            date = 40000 + i,
            money = i * 1000,
        ));
    }
    content.push_str(
        r#"
  </sheetData>
</worksheet>"#,
    );

    zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
    zip.write_all(content.as_bytes()).unwrap();

    zip.finish().unwrap();
    buffer
}

/// Benchmark full sheet conversion at various sizes.
fn bench_sheet_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("sheet_conversion");

    for row_count in [100, 1000, 10000].iter() {
        let data = create_test_xlsx(*row_count);
        let size = data.len() as u64;

        group.throughput(Throughput::Bytes(size));
        group.bench_with_input(BenchmarkId::new("rows", row_count), &data, |b, data| {
            b.iter(|| {
                let mut reader = XlsxReader::from_bytes(black_box(data.clone())).unwrap();
                let sheet = reader.find_sheet(None).unwrap().clone();
                let mut grid = GridSerializer::new(Vec::new(), &CsvOptions::default());
                grid.write_events(reader.sheet_events(&sheet).unwrap()).unwrap();
                grid.finish().unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark workbook opening (shared strings and styles loading).
fn bench_workbook_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("workbook_open");

    for row_count in [1000, 10000].iter() {
        let data = create_test_xlsx(*row_count);

        group.bench_with_input(BenchmarkId::new("rows", row_count), &data, |b, data| {
            b.iter(|| XlsxReader::from_bytes(black_box(data.clone())).unwrap().sheet_count());
        });
    }

    group.finish();
}

/// Benchmark value formatting.
fn bench_value_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_formatting");
    let formatter = CellFormatter::new(DateSystem::Excel1900);

    let rules = [
        ("general", FormatRule::general()),
        ("thousands", FormatRule::new(4, "#,##0.00")),
        ("date", FormatRule::new(14, "m/d/yy")),
        ("datetime", FormatRule::new(164, "yyyy-mm-dd hh:mm:ss")),
    ];
    for (name, rule) in rules.iter() {
        group.bench_with_input(BenchmarkId::new("rule", name), rule, |b, rule| {
            b.iter(|| formatter.format(black_box(44197.4375), rule));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sheet_conversion,
    bench_workbook_open,
    bench_value_formatting,
);
criterion_main!(benches);
