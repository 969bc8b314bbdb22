pub(crate) mod scheme;
use std::convert::{TryFrom, TryInto};

pub use scheme::{
    AttributeKey, Ciphertext, CiphertextComponent, IntermediateValue, MasterSecret,
    ProxyTransformationKey, PublicParameters, UserKeyPair, UserPublicKey, UserSecretKey, Yllc,
};

use crate::error::FormatErr;

pub trait AsBytes: Sized {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr>;
    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr>;
    fn len_bytes(&self) -> usize;
}

impl AsBytes for u32 {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        Ok(self.to_be_bytes().to_vec())
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        if bytes.len() < 4 {
            return Err(FormatErr::Deserialization(
                "cannot deserialize u32 element since input bytes size is less than 4 bytes"
                    .to_string(),
            ));
        }
        Ok(Self::from_be_bytes(bytes[0..4].try_into()?))
    }

    fn len_bytes(&self) -> usize {
        4
    }
}

// Strings are prefixed by their length as a big endian u32
impl AsBytes for String {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        let mut bytes = u32::try_from(self.len())?.try_into_bytes()?;
        bytes.extend_from_slice(self.as_bytes());
        Ok(bytes)
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let len = u32::try_from_bytes(bytes)? as usize;
        if bytes.len() < 4 + len {
            return Err(FormatErr::InvalidSize(format!(
                "string of {len} bytes announced but only {} bytes left",
                bytes.len() - 4
            )));
        }
        Ok(String::from_utf8(bytes[4..4 + len].to_vec())?)
    }

    fn len_bytes(&self) -> usize {
        4 + self.len()
    }
}

/// Sequential reader over serialized elements
pub(crate) struct BytesReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BytesReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub(crate) fn read<T: AsBytes>(&mut self) -> Result<T, FormatErr> {
        let remaining = self.bytes.get(self.position..).ok_or_else(|| {
            FormatErr::Deserialization("reading past the end of the input".to_string())
        })?;
        let value = T::try_from_bytes(remaining)?;
        self.position += value.len_bytes();
        Ok(value)
    }

    /// Fails if some input was left unread
    pub(crate) fn finish(self) -> Result<(), FormatErr> {
        match self.bytes.len().checked_sub(self.position) {
            Some(0) => Ok(()),
            Some(left) => Err(FormatErr::InvalidSize(format!(
                "{left} trailing bytes after the serialized value"
            ))),
            None => Err(FormatErr::Deserialization(
                "reading past the end of the input".to_string(),
            )),
        }
    }
}

/// Concatenate the serialization of several elements
pub(crate) fn concat_bytes(elements: &[&dyn AsBytesDyn]) -> Result<Vec<u8>, FormatErr> {
    let mut res = Vec::with_capacity(elements.iter().map(|e| e.dyn_len_bytes()).sum());
    for element in elements {
        res.append(&mut element.dyn_try_into_bytes()?);
    }
    Ok(res)
}

// Object safe view of `AsBytes` used to serialize heterogeneous elements
pub(crate) trait AsBytesDyn {
    fn dyn_try_into_bytes(&self) -> Result<Vec<u8>, FormatErr>;
    fn dyn_len_bytes(&self) -> usize;
}

impl<T: AsBytes> AsBytesDyn for T {
    fn dyn_try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        self.try_into_bytes()
    }

    fn dyn_len_bytes(&self) -> usize {
        self.len_bytes()
    }
}
