//! Core types shared by the reader, mapper and writer.
//!
//! - [`records`]: the five record shapes and the [`Record`] trait
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod records;

pub use identifier::{qualify, quote_ident};
pub use records::{ColumnSpec, FilmWork, Genre, GenreFilmWork, Person, PersonFilmWork, Record};
