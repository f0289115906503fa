pub(crate) trait BytesExt {
    /// Xor self with another slice of bytes of equal length
    fn xor<B: AsRef<[u8]>>(&self, other: B) -> Vec<u8>;

    /// Xor another slice of bytes into self. Only the overlapping prefix is touched, so a keystream
    /// longer than the data is fine.
    fn xor_in_place<B: AsRef<[u8]>>(&mut self, other: B);
}

fn assert_same_length(a: &[u8], b: &[u8]) {
    assert_eq!(a.len(), b.len(), "Length mismatch: {} != {}", a.len(), b.len());
}

impl BytesExt for [u8] {
    fn xor<B: AsRef<[u8]>>(&self, other: B) -> Vec<u8> {
        assert_same_length(self, other.as_ref());

        self.iter()
            .zip(other.as_ref().iter())
            .map(|(a, b)| a ^ b)
            .collect()
    }

    fn xor_in_place<B: AsRef<[u8]>>(&mut self, other: B) {
        for (byte, key_byte) in self.iter_mut().zip(other.as_ref().iter()) {
            *byte ^= key_byte;
        }
    }
}
