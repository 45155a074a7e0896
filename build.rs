use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // For each hid.bin file in our test/data directory, create one test function
    // per text format that converts the report descriptor there and back
    let datadir: PathBuf = [concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data")].iter().collect();
    println!("cargo:rerun-if-changed={}", datadir.display());
    let out_dir = std::env::var_os("OUT_DIR").ok_or("OUT_DIR is not set")?;
    let dest_path = PathBuf::from(&out_dir).join("test-report-descriptors.rs");
    let mut file = std::fs::File::create(dest_path)?;

    writeln!(file, "use hidrd::fmt::Format;")?;
    writeln!(file, "use hidrd::strm::{{copy, OutBuf}};")?;
    writeln!(file)?;

    let mut entries: Vec<_> = std::fs::read_dir(datadir)?.flatten().collect();
    entries.sort_by_key(|e| e.file_name());
    for rdesc in entries {
        let filename = rdesc.file_name().to_string_lossy().into_owned();
        if !filename.ends_with(".hid.bin") {
            continue;
        }
        let funcname = filename.replace([':', '.', '-'], "_");
        let path = rdesc.path();
        for format in ["xml", "hex"] {
            writeln!(
                file,
                "
#[test]
#[allow(non_snake_case)]
fn test_{format}_{funcname}() {{
    let bytes: Vec<u8> = std::fs::read({path:?}).unwrap();
    let format: Format = \"{format}\".parse().unwrap();

    let mut text = Vec::new();
    {{
        let mut source = Format::Natv.source(&bytes, \"\").unwrap();
        let mut sink = format.sink(OutBuf::from(&mut text), \"\").unwrap();
        copy(source.as_mut(), sink.as_mut())
            .unwrap_or_else(|e| panic!(\"Failed to convert {filename} to {format}: {{e}}\"));
    }}

    let mut back = Vec::new();
    {{
        let mut source = format.source(&text, \"\").unwrap();
        let mut sink = Format::Natv.sink(OutBuf::from(&mut back), \"\").unwrap();
        copy(source.as_mut(), sink.as_mut())
            .unwrap_or_else(|e| panic!(\"Failed to convert {filename} back from {format}: {{e}}\"));
    }}
    assert_eq!(back, bytes, \"{filename} changed in a round trip through {format}\");
}}
"
            )?;
        }
    }

    Ok(())
}
