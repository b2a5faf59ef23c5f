use anyhow::Result;
use fenn_reader::read::{read_all, write_all};

const INPUT: &[u8] = include_bytes!("t-input.fenn");
const EXPECTED: &[u8] = include_bytes!("t-expected.fenn");

#[test]
fn t1() -> Result<()> {
    let vals = read_all(INPUT)?;
    let mut out = Vec::<u8>::new();
    write_all(&mut out, &vals)?;
    assert_eq!(String::from_utf8_lossy(&out), String::from_utf8_lossy(EXPECTED));
    Ok(())
}

#[test]
fn output_reads_back_equal() -> Result<()> {
    let vals = read_all(INPUT)?;
    let mut out = Vec::<u8>::new();
    write_all(&mut out, &vals)?;
    let again = read_all(&out[..])?;
    assert_eq!(vals.len(), again.len());
    for (a, b) in vals.iter().zip(&again) {
        // buffers compare by identity
        if !matches!(a, fenn_reader::value::Value::Buffer(_)) {
            assert_eq!(a, b);
        }
    }
    Ok(())
}
