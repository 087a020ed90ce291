macro_rules! read_as {
    ($ty:ty, $buf:ident, $start:expr) => {{
        let end = $start + std::mem::size_of::<$ty>();
        <$ty>::from_be_bytes($buf[$start..end].try_into().unwrap())
    }};
}
pub(crate) use read_as;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_as_u32() {
        let buf: Vec<u8> = vec![0x00, 0x01, 0x02, 0x03, 0x04];
        assert_eq!(read_as!(u32, buf, 1), 0x01020304);
    }

    #[test]
    fn read_as_u64() {
        let buf: Vec<u8> = vec![0, 0, 0, 0, 0, 0, 0, 0x2a];
        assert_eq!(read_as!(u64, buf, 0), 42);
    }
}
