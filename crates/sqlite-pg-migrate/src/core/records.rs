//! Record shapes for the five migrated tables.
//!
//! Each record is an immutable snapshot of one source row. Its `COLUMNS`
//! describe both how it is read (by name, with aliases) and the column list
//! of its destination insert, in the order [`Record::params`] yields values.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use crate::error::Result;
use crate::mapping::RowView;

/// One column of a record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Destination column name, also the preferred source name.
    pub name: &'static str,
    /// Other source names accepted for this column.
    pub aliases: &'static [&'static str],
}

impl ColumnSpec {
    const fn new(name: &'static str) -> Self {
        Self { name, aliases: &[] }
    }

    const fn aliased(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }

    /// Names this column may carry in the source, preferred first.
    pub fn source_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }

    /// Whether a source column name binds to this column.
    pub fn matches(&self, source_name: &str) -> bool {
        self.source_names().any(|n| n == source_name)
    }
}

const ID: ColumnSpec = ColumnSpec::new("id");
const CREATED: ColumnSpec = ColumnSpec::aliased("created", &["created_at"]);
const MODIFIED: ColumnSpec = ColumnSpec::aliased("modified", &["updated_at"]);
const FILM_WORK_ID: ColumnSpec = ColumnSpec::new("film_work_id");

/// A typed row of one migrated table.
pub trait Record: Sized + Send + Sync {
    /// Source and destination table name.
    const TABLE: &'static str;

    /// Columns in destination insert order.
    const COLUMNS: &'static [ColumnSpec];

    /// Build the record from a source row, binding columns by name.
    fn from_row(row: &RowView<'_>) -> Result<Self>;

    /// Primary key, carried over from the source.
    fn id(&self) -> Uuid;

    /// Bind parameters in `COLUMNS` order.
    fn params(&self) -> Vec<&(dyn ToSql + Sync)>;
}

/// A film or series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmWork {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub creation_date: Option<NaiveDate>,
    pub file_path: Option<String>,
    /// NULL ratings in the source become `0.0`.
    pub rating: f64,
    /// Work type tag (`movie`, `tv_show`, ...).
    pub r#type: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl FilmWork {
    const TITLE: ColumnSpec = ColumnSpec::new("title");
    const DESCRIPTION: ColumnSpec = ColumnSpec::new("description");
    const CREATION_DATE: ColumnSpec = ColumnSpec::new("creation_date");
    const FILE_PATH: ColumnSpec = ColumnSpec::new("file_path");
    const RATING: ColumnSpec = ColumnSpec::new("rating");
    const TYPE: ColumnSpec = ColumnSpec::new("type");
}

impl Record for FilmWork {
    const TABLE: &'static str = "film_work";
    const COLUMNS: &'static [ColumnSpec] = &[
        ID,
        Self::TITLE,
        Self::DESCRIPTION,
        Self::CREATION_DATE,
        Self::FILE_PATH,
        Self::RATING,
        Self::TYPE,
        CREATED,
        MODIFIED,
    ];

    fn from_row(row: &RowView<'_>) -> Result<Self> {
        Ok(Self {
            id: row.uuid(&ID)?,
            title: row.text(&Self::TITLE)?,
            description: row.opt_text(&Self::DESCRIPTION)?,
            creation_date: row.opt_date(&Self::CREATION_DATE)?,
            file_path: row.opt_text(&Self::FILE_PATH)?,
            rating: row.opt_f64(&Self::RATING)?.unwrap_or(0.0),
            r#type: row.opt_text(&Self::TYPE)?,
            created: row.opt_timestamp(&CREATED)?,
            modified: row.opt_timestamp(&MODIFIED)?,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let params: [&(dyn ToSql + Sync); 9] = [
            &self.id,
            &self.title,
            &self.description,
            &self.creation_date,
            &self.file_path,
            &self.rating,
            &self.r#type,
            &self.created,
            &self.modified,
        ];
        params.to_vec()
    }
}

/// A genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl Genre {
    const NAME: ColumnSpec = ColumnSpec::new("name");
    const DESCRIPTION: ColumnSpec = ColumnSpec::new("description");
}

impl Record for Genre {
    const TABLE: &'static str = "genre";
    const COLUMNS: &'static [ColumnSpec] =
        &[ID, Self::NAME, Self::DESCRIPTION, CREATED, MODIFIED];

    fn from_row(row: &RowView<'_>) -> Result<Self> {
        Ok(Self {
            id: row.uuid(&ID)?,
            name: row.text(&Self::NAME)?,
            description: row.opt_text(&Self::DESCRIPTION)?,
            created: row.opt_timestamp(&CREATED)?,
            modified: row.opt_timestamp(&MODIFIED)?,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let params: [&(dyn ToSql + Sync); 5] = [
            &self.id,
            &self.name,
            &self.description,
            &self.created,
            &self.modified,
        ];
        params.to_vec()
    }
}

/// A person credited on film works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub full_name: String,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl Person {
    const FULL_NAME: ColumnSpec = ColumnSpec::new("full_name");
}

impl Record for Person {
    const TABLE: &'static str = "person";
    const COLUMNS: &'static [ColumnSpec] = &[ID, Self::FULL_NAME, CREATED, MODIFIED];

    fn from_row(row: &RowView<'_>) -> Result<Self> {
        Ok(Self {
            id: row.uuid(&ID)?,
            full_name: row.text(&Self::FULL_NAME)?,
            created: row.opt_timestamp(&CREATED)?,
            modified: row.opt_timestamp(&MODIFIED)?,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let params: [&(dyn ToSql + Sync); 4] = [
            &self.id,
            &self.full_name,
            &self.created,
            &self.modified,
        ];
        params.to_vec()
    }
}

/// Link between a film work and a genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreFilmWork {
    pub id: Uuid,
    pub film_work_id: Uuid,
    pub genre_id: Uuid,
    pub created: Option<DateTime<Utc>>,
}

impl GenreFilmWork {
    const GENRE_ID: ColumnSpec = ColumnSpec::new("genre_id");
}

impl Record for GenreFilmWork {
    const TABLE: &'static str = "genre_film_work";
    const COLUMNS: &'static [ColumnSpec] = &[ID, FILM_WORK_ID, Self::GENRE_ID, CREATED];

    fn from_row(row: &RowView<'_>) -> Result<Self> {
        Ok(Self {
            id: row.uuid(&ID)?,
            film_work_id: row.uuid(&FILM_WORK_ID)?,
            genre_id: row.uuid(&Self::GENRE_ID)?,
            created: row.opt_timestamp(&CREATED)?,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let params: [&(dyn ToSql + Sync); 4] = [
            &self.id,
            &self.film_work_id,
            &self.genre_id,
            &self.created,
        ];
        params.to_vec()
    }
}

/// Link between a film work and a person, with the person's role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonFilmWork {
    pub id: Uuid,
    pub film_work_id: Uuid,
    pub person_id: Uuid,
    pub role: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

impl PersonFilmWork {
    const PERSON_ID: ColumnSpec = ColumnSpec::new("person_id");
    const ROLE: ColumnSpec = ColumnSpec::new("role");
}

impl Record for PersonFilmWork {
    const TABLE: &'static str = "person_film_work";
    const COLUMNS: &'static [ColumnSpec] =
        &[ID, FILM_WORK_ID, Self::PERSON_ID, Self::ROLE, CREATED];

    fn from_row(row: &RowView<'_>) -> Result<Self> {
        Ok(Self {
            id: row.uuid(&ID)?,
            film_work_id: row.uuid(&FILM_WORK_ID)?,
            person_id: row.uuid(&Self::PERSON_ID)?,
            role: row.opt_text(&Self::ROLE)?,
            created: row.opt_timestamp(&CREATED)?,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let params: [&(dyn ToSql + Sync); 5] = [
            &self.id,
            &self.film_work_id,
            &self.person_id,
            &self.role,
            &self.created,
        ];
        params.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_params_match_columns<R: Record>(record: &R) {
        assert_eq!(record.params().len(), R::COLUMNS.len(), "{}", R::TABLE);
    }

    #[test]
    fn test_column_aliases() {
        assert!(CREATED.matches("created"));
        assert!(CREATED.matches("created_at"));
        assert!(!CREATED.matches("updated_at"));
        assert_eq!(
            MODIFIED.source_names().collect::<Vec<_>>(),
            vec!["modified", "updated_at"]
        );
    }

    #[test]
    fn test_params_match_columns() {
        let id = Uuid::new_v4();
        assert_params_match_columns(&FilmWork {
            id,
            title: "Star Wars".into(),
            description: None,
            creation_date: None,
            file_path: None,
            rating: 8.6,
            r#type: Some("movie".into()),
            created: None,
            modified: None,
        });
        assert_params_match_columns(&Genre {
            id,
            name: "Sci-Fi".into(),
            description: None,
            created: None,
            modified: None,
        });
        assert_params_match_columns(&Person {
            id,
            full_name: "George Lucas".into(),
            created: None,
            modified: None,
        });
        assert_params_match_columns(&GenreFilmWork {
            id,
            film_work_id: id,
            genre_id: id,
            created: None,
        });
        assert_params_match_columns(&PersonFilmWork {
            id,
            film_work_id: id,
            person_id: id,
            role: Some("director".into()),
            created: None,
        });
    }

    #[test]
    fn test_column_names_unique() {
        for columns in [
            FilmWork::COLUMNS,
            Genre::COLUMNS,
            Person::COLUMNS,
            GenreFilmWork::COLUMNS,
            PersonFilmWork::COLUMNS,
        ] {
            let mut names: Vec<_> = columns.iter().map(|c| c.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), columns.len());
            assert_eq!(columns[0].name, "id");
        }
    }
}
