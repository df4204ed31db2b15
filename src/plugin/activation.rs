use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::config::ModPaths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Park,
    Restore,
}

impl Direction {
    pub fn verb(&self) -> &'static str {
        match self {
            Direction::Park => "disable",
            Direction::Restore => "enable",
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to {} mod {locator}: {source}", .direction.verb())]
pub struct ActivationError {
    pub locator: String,
    pub direction: Direction,
    pub source: io::Error,
}

/// Moves mods between the folder the game loads and the parked folder.
///
/// Each call stops at the first archive that fails to move; archives already
/// moved by that call stay where they are.
pub trait Activation {
    fn park(&mut self, locators: &[String]) -> Result<(), ActivationError>;
    fn restore(&mut self, locators: &[String]) -> Result<(), ActivationError>;
}

/// Activation backed by two directories and one rename per archive.
#[derive(Debug, Clone)]
pub struct DirActivation {
    active: PathBuf,
    parked: PathBuf,
}

impl DirActivation {
    pub fn new(paths: &ModPaths) -> Self {
        Self {
            active: paths.active.clone(),
            parked: paths.parked.clone(),
        }
    }

    fn move_all(&self, locators: &[String], direction: Direction) -> Result<(), ActivationError> {
        let (from, to) = match direction {
            Direction::Park => (&self.active, &self.parked),
            Direction::Restore => (&self.parked, &self.active),
        };

        for locator in locators {
            move_archive(from, to, locator).map_err(|source| ActivationError {
                locator: locator.clone(),
                direction,
                source,
            })?;
            tracing::debug!("{} {locator}", direction.verb());
        }

        Ok(())
    }
}

impl Activation for DirActivation {
    fn park(&mut self, locators: &[String]) -> Result<(), ActivationError> {
        self.move_all(locators, Direction::Park)
    }

    fn restore(&mut self, locators: &[String]) -> Result<(), ActivationError> {
        self.move_all(locators, Direction::Restore)
    }
}

fn move_archive(from: &Path, to: &Path, locator: &str) -> io::Result<()> {
    let source = from.join(locator);
    let target = to.join(locator);

    // A missing source must fail before the destination is touched.
    fs::metadata(&source)?;
    match fs::remove_file(&target) {
        Ok(()) => tracing::debug!("removed stale {}", target.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    fs::rename(&source, &target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn setup() -> (tempfile::TempDir, ModPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModPaths {
            active: dir.path().join("Mods"),
            parked: dir.path().join("DisabledMods"),
        };
        fs::create_dir_all(&paths.active).unwrap();
        fs::create_dir_all(&paths.parked).unwrap();
        (dir, paths)
    }

    #[test]
    fn park_and_restore_move_archives() {
        let (_dir, paths) = setup();
        fs::write(paths.active.join("a.zip"), "a").unwrap();
        fs::write(paths.active.join("b.zip"), "b").unwrap();
        let mut activation = DirActivation::new(&paths);

        activation.park(&["a.zip".into()]).unwrap();
        assert!(!paths.active.join("a.zip").exists());
        assert!(paths.parked.join("a.zip").exists());
        assert!(paths.active.join("b.zip").exists());

        activation.restore(&["a.zip".into()]).unwrap();
        assert_eq!(fs::read_to_string(paths.active.join("a.zip")).unwrap(), "a");
        assert!(!paths.parked.join("a.zip").exists());
    }

    #[test]
    fn stale_destination_is_replaced() {
        let (_dir, paths) = setup();
        fs::write(paths.active.join("a.zip"), "fresh").unwrap();
        fs::write(paths.parked.join("a.zip"), "stale").unwrap();

        DirActivation::new(&paths).park(&["a.zip".into()]).unwrap();
        assert_eq!(fs::read_to_string(paths.parked.join("a.zip")).unwrap(), "fresh");
    }

    #[test]
    fn missing_source_leaves_destination_alone() {
        let (_dir, paths) = setup();
        fs::write(paths.parked.join("a.zip"), "parked").unwrap();

        assert!(DirActivation::new(&paths).park(&["a.zip".into()]).is_err());
        assert_eq!(fs::read_to_string(paths.parked.join("a.zip")).unwrap(), "parked");
    }

    #[test]
    fn first_failure_stops_the_batch() {
        let (_dir, paths) = setup();
        fs::write(paths.active.join("a.zip"), "a").unwrap();
        fs::write(paths.active.join("c.zip"), "c").unwrap();

        let err = DirActivation::new(&paths)
            .park(&["a.zip".into(), "missing.zip".into(), "c.zip".into()])
            .unwrap_err();

        assert_eq!(err.locator, "missing.zip");
        assert_eq!(err.direction, Direction::Park);
        assert!(err.to_string().starts_with("failed to disable mod missing.zip"));
        assert!(paths.parked.join("a.zip").exists());
        assert!(paths.active.join("c.zip").exists());
    }
}
