pub mod row;

pub use row::{COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, Column, ROW_SIZE, Row, RowError};
