//! Fixture files read by the seeder.
//!
//! A data directory holds one JSON array per collection:
//! `users.json`, `bootcamps.json`, `courses.json` and `reviews.json`.
//! Ids are UUID strings so references between files survive the import.
//! User fixtures carry plain-text passwords, hashed on import.

use std::fs;
use std::path::{Path, PathBuf};

use devcamper_db::{Collection, Document};

use super::SeedError;

#[derive(Debug, Default)]
pub struct Fixtures {
    pub users: Vec<Document>,
    pub bootcamps: Vec<Document>,
    pub courses: Vec<Document>,
    pub reviews: Vec<Document>,
}

impl Fixtures {
    /// Reads every fixture file in `dir`. Missing files count as empty.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, SeedError> {
        let dir = dir.as_ref();
        Ok(Self {
            users: read_collection(dir, Collection::Users)?,
            bootcamps: read_collection(dir, Collection::Bootcamps)?,
            courses: read_collection(dir, Collection::Courses)?,
            reviews: read_collection(dir, Collection::Reviews)?,
        })
    }

    pub fn len(&self) -> usize {
        self.users.len() + self.bootcamps.len() + self.courses.len() + self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn fixture_path(dir: &Path, collection: Collection) -> PathBuf {
    dir.join(format!("{}.json", collection.name()))
}

fn read_collection(dir: &Path, collection: Collection) -> Result<Vec<Document>, SeedError> {
    let path = fixture_path(dir, collection);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(&path).map_err(|source| SeedError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| SeedError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("devcamper-fixtures-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_reads_arrays_and_skips_missing_files() {
        let dir = scratch_dir();
        fs::write(
            dir.join("bootcamps.json"),
            r#"[{"name": "Devworks Bootcamp"}, {"name": "ModernTech Bootcamp"}]"#,
        )
        .unwrap();

        let fixtures = Fixtures::load(&dir).unwrap();
        assert_eq!(fixtures.bootcamps.len(), 2);
        assert!(fixtures.users.is_empty());
        assert_eq!(fixtures.len(), 2);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_rejects_non_array_fixture() {
        let dir = scratch_dir();
        fs::write(dir.join("users.json"), r#"{"name": "not an array"}"#).unwrap();

        let result = Fixtures::load(&dir);
        assert!(matches!(result, Err(SeedError::Parse { .. })));

        fs::remove_dir_all(dir).unwrap();
    }
}
