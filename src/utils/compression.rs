use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut enc = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    enc.write_all(data)?;
    enc.finish()
}

pub fn gunzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 2);
    GzDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gunzip_restores_payload() {
        let payload = vec![0xFFu8; 4096];
        let packed = gzip(&payload).unwrap();
        assert!(packed.len() < payload.len());
        assert_eq!(gunzip(&packed).unwrap(), payload);
    }

    #[test]
    fn gunzip_rejects_plain_bytes() {
        assert!(gunzip(b"\xFF\xD8\xFF not gzip").is_err());
    }
}
