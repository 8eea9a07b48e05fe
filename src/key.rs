//! Key derivation
//!
//! Application keys are coerced to bytes the same way every time: strings
//! become their UTF-8 bytes and integers become their decimal text, so
//! `42` and `"42"` name the same entry.

/// Something that can name a cache entry
pub trait CacheKey {
    fn key_bytes(&self) -> Vec<u8>;
}

impl CacheKey for str {
    fn key_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl CacheKey for String {
    fn key_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl<K: CacheKey + ?Sized> CacheKey for &K {
    fn key_bytes(&self) -> Vec<u8> {
        (**self).key_bytes()
    }
}

macro_rules! impl_integer_key {
    ($($t:ty),*) => {
        $(
            impl CacheKey for $t {
                fn key_bytes(&self) -> Vec<u8> {
                    self.to_string().into_bytes()
                }
            }
        )*
    };
}

impl_integer_key!(i32, i64, u32, u64, usize);
