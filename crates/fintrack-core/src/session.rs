//! Session identity store
//!
//! Holds the authenticated identity between invocations. The durable slot is
//! namespaced `fa_user`: `fa_user.json` holds the serialized [`Session`] and
//! `fa_user_name` caches the display name. Both are written by [`SessionStore::set`]
//! and removed together by [`SessionStore::clear`].
//!
//! The store does no validation. Operations that need identity call
//! [`SessionStore::require`] exactly once and carry the returned value for
//! the rest of the operation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::Session;

const SESSION_FILE: &str = "fa_user.json";
const NAME_FILE: &str = "fa_user_name";
const FALLBACK_NAME: &str = "User";

#[derive(Default)]
struct Slot {
    session: Option<Session>,
    display_name: Option<String>,
}

impl Slot {
    fn display_name(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.session.as_ref().map(|s| s.display_name.clone()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| FALLBACK_NAME.to_string())
    }
}

/// Shared handle to the current identity
#[derive(Clone, Default)]
pub struct SessionStore {
    slot: Arc<RwLock<Slot>>,
    dir: Option<PathBuf>,
}

impl SessionStore {
    /// A store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the durable slot in `dir`, loading any saved identity
    ///
    /// A corrupt session file is treated as logged out.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let session = match read_optional(&dir.join(SESSION_FILE))? {
            Some(content) => match serde_json::from_str::<Session>(&content) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable session file");
                    None
                }
            },
            None => None,
        };
        let display_name = read_optional(&dir.join(NAME_FILE))?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        debug!(dir = %dir.display(), logged_in = session.is_some(), "Opened session store");

        Ok(Self {
            slot: Arc::new(RwLock::new(Slot {
                session,
                display_name,
            })),
            dir: Some(dir),
        })
    }

    pub fn get(&self) -> Option<Session> {
        self.read(|slot| slot.session.clone())
    }

    /// Current session, or `Auth` if nobody is logged in
    pub fn require(&self) -> Result<Session> {
        self.get().ok_or_else(Error::not_logged_in)
    }

    pub fn set(&self, session: Session) -> Result<()> {
        let name = session.display_name.clone();
        if let Some(dir) = &self.dir {
            fs::write(dir.join(SESSION_FILE), serde_json::to_vec(&session).map_err(io::Error::from)?)?;
            fs::write(dir.join(NAME_FILE), &name)?;
        }
        self.write(|slot| {
            slot.session = Some(session);
            slot.display_name = Some(name);
        });
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if let Some(dir) = &self.dir {
            remove_if_present(&dir.join(SESSION_FILE))?;
            remove_if_present(&dir.join(NAME_FILE))?;
        }
        self.write(|slot| *slot = Slot::default());
        Ok(())
    }

    /// Cached display name, else the session's, else "User"
    pub fn display_name(&self) -> String {
        self.read(Slot::display_name)
    }

    /// Session and display name from a single read, or `Auth` if logged out
    pub fn snapshot(&self) -> Result<(Session, String)> {
        self.read(|slot| {
            let session = slot.session.clone().ok_or_else(Error::not_logged_in)?;
            Ok((session, slot.display_name()))
        })
    }

    fn read<T>(&self, f: impl FnOnce(&Slot) -> T) -> T {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write(&self, f: impl FnOnce(&mut Slot)) {
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
