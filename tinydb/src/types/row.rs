//! Fixed-width row record and its on-page encoding.
//!
//! Layout (293 bytes):
//! - `id`: 4 bytes (little-endian u32)
//! - `username`: 33 bytes (up to 32 bytes of text, zero padded)
//! - `email`: 256 bytes (up to 255 bytes of text, zero padded)
//!
//! The text fields keep one trailing byte beyond their usable capacity so a
//! full-length value is still followed by a zero byte on disk.

use std::borrow::Cow;

/// Maximum username length in bytes.
pub const COLUMN_USERNAME_SIZE: usize = 32;
/// Maximum email length in bytes.
pub const COLUMN_EMAIL_SIZE: usize = 255;

pub const ID_SIZE: usize = std::mem::size_of::<u32>();
pub const USERNAME_SIZE: usize = COLUMN_USERNAME_SIZE + 1;
pub const EMAIL_SIZE: usize = COLUMN_EMAIL_SIZE + 1;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Serialized row width in bytes.
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A table row: `(id, username, email)`.
#[derive(Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    username: [u8; USERNAME_SIZE],
    email: [u8; EMAIL_SIZE],
}

impl Row {
    /// Build a row from text columns.
    ///
    /// Fails if either column is longer than its capacity; nothing is
    /// silently truncated.
    pub fn new(id: u32, username: &str, email: &str) -> Result<Self, RowError> {
        Self::from_bytes(id, username.as_bytes(), email.as_bytes())
    }

    /// Build a row from raw column bytes. Embedded zero bytes are kept as-is.
    pub fn from_bytes(id: u32, username: &[u8], email: &[u8]) -> Result<Self, RowError> {
        Ok(Self {
            id,
            username: pad_column::<USERNAME_SIZE>(
                Column::Username,
                username,
                COLUMN_USERNAME_SIZE,
            )?,
            email: pad_column::<EMAIL_SIZE>(Column::Email, email, COLUMN_EMAIL_SIZE)?,
        })
    }

    /// Username text up to the first zero byte.
    #[must_use]
    pub fn username(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(until_nul(&self.username))
    }

    /// Email text up to the first zero byte.
    #[must_use]
    pub fn email(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(until_nul(&self.email))
    }

    /// Write the row into `dest` at the fixed column offsets.
    ///
    /// Each column copies exactly its field width, so the write never
    /// depends on where a zero byte happens to sit in the text.
    pub fn serialize(&self, dest: &mut [u8]) -> Result<(), RowError> {
        if dest.len() < ROW_SIZE {
            return Err(RowError::BufferTooSmall { len: dest.len() });
        }

        dest[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        dest[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE].copy_from_slice(&self.username);
        dest[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE].copy_from_slice(&self.email);

        Ok(())
    }

    /// Read a row back from its serialized form.
    pub fn deserialize(src: &[u8]) -> Result<Self, RowError> {
        if src.len() < ROW_SIZE {
            return Err(RowError::BufferTooSmall { len: src.len() });
        }

        let id = u32::from_le_bytes([
            src[ID_OFFSET],
            src[ID_OFFSET + 1],
            src[ID_OFFSET + 2],
            src[ID_OFFSET + 3],
        ]);

        let mut username = [0u8; USERNAME_SIZE];
        username.copy_from_slice(&src[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]);

        let mut email = [0u8; EMAIL_SIZE];
        email.copy_from_slice(&src[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]);

        Ok(Self {
            id,
            username,
            email,
        })
    }
}

fn pad_column<const N: usize>(
    column: Column,
    value: &[u8],
    max: usize,
) -> Result<[u8; N], RowError> {
    if value.len() > max {
        return Err(RowError::StringTooLong {
            column,
            len: value.len(),
            max,
        });
    }
    let mut field = [0u8; N];
    field[..value.len()].copy_from_slice(value);
    Ok(field)
}

fn until_nul(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username(), self.email())
    }
}

impl std::fmt::Debug for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row")
            .field("id", &self.id)
            .field("username", &self.username())
            .field("email", &self.email())
            .finish()
    }
}

/// Text columns of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Username,
    Email,
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Username => write!(f, "username"),
            Self::Email => write!(f, "email"),
        }
    }
}

/// Errors that can occur when building or encoding a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// A text column is longer than its capacity.
    StringTooLong {
        column: Column,
        len: usize,
        max: usize,
    },
    /// The buffer cannot hold a serialized row.
    BufferTooSmall { len: usize },
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StringTooLong { column, len, max } => {
                write!(f, "{column} is too long: {len} bytes (max {max})")
            }
            Self::BufferTooSmall { len } => {
                write!(f, "buffer too small for a row: {len} bytes (need {ROW_SIZE})")
            }
        }
    }
}

impl std::error::Error for RowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_size_constants() {
        assert_eq!(ID_SIZE, 4);
        assert_eq!(USERNAME_SIZE, 33);
        assert_eq!(EMAIL_SIZE, 256);
        assert_eq!(ROW_SIZE, 293);
        assert_eq!(EMAIL_OFFSET, 37);
    }

    #[test]
    fn test_row_roundtrip() {
        let row = Row::new(42, "alice", "alice@example.com").expect("valid row");

        let mut buf = [0u8; ROW_SIZE];
        row.serialize(&mut buf).expect("serialize");
        let restored = Row::deserialize(&buf).expect("deserialize");

        assert_eq!(restored, row);
        assert_eq!(restored.id, 42);
        assert_eq!(restored.username(), "alice");
        assert_eq!(restored.email(), "alice@example.com");
    }

    #[test]
    fn test_row_roundtrip_max_length() {
        let username = "u".repeat(COLUMN_USERNAME_SIZE);
        let email = "e".repeat(COLUMN_EMAIL_SIZE);
        let row = Row::new(u32::MAX, &username, &email).expect("valid row");

        let mut buf = [0xAAu8; ROW_SIZE];
        row.serialize(&mut buf).expect("serialize");
        // The spare byte after a full-length column is still zero.
        assert_eq!(buf[USERNAME_OFFSET + COLUMN_USERNAME_SIZE], 0);
        assert_eq!(buf[EMAIL_OFFSET + COLUMN_EMAIL_SIZE], 0);

        let restored = Row::deserialize(&buf).expect("deserialize");
        assert_eq!(restored, row);
        assert_eq!(restored.username(), username);
        assert_eq!(restored.email(), email);
    }

    #[test]
    fn test_row_embedded_nul_survives_roundtrip() {
        let row = Row::from_bytes(7, b"ab\0cd", b"x\0y").expect("valid row");

        let mut buf = vec![0u8; ROW_SIZE];
        row.serialize(&mut buf).expect("serialize");
        assert_eq!(&buf[USERNAME_OFFSET..USERNAME_OFFSET + 5], b"ab\0cd");

        let restored = Row::deserialize(&buf).expect("deserialize");
        assert_eq!(restored, row);
        assert_eq!(restored.username(), "ab");
    }

    #[test]
    fn test_row_rejects_long_columns() {
        let long_name = "n".repeat(COLUMN_USERNAME_SIZE + 1);
        assert_eq!(
            Row::new(1, &long_name, "a@b.c"),
            Err(RowError::StringTooLong {
                column: Column::Username,
                len: 33,
                max: 32
            })
        );

        let long_email = "e".repeat(COLUMN_EMAIL_SIZE + 1);
        assert!(matches!(
            Row::new(1, "bob", &long_email),
            Err(RowError::StringTooLong {
                column: Column::Email,
                ..
            })
        ));
    }

    #[test]
    fn test_row_buffer_too_small() {
        let row = Row::new(1, "a", "b").expect("valid row");
        let mut buf = [0u8; ROW_SIZE - 1];
        assert_eq!(
            row.serialize(&mut buf),
            Err(RowError::BufferTooSmall { len: ROW_SIZE - 1 })
        );
        assert!(Row::deserialize(&buf).is_err());
    }

    #[test]
    fn test_row_display() {
        let row = Row::new(1, "user1", "person1@example.com").expect("valid row");
        assert_eq!(row.to_string(), "(1, user1, person1@example.com)");
    }
}
