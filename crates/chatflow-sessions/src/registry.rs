use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chatflow_core::{PrincipalId, UserData};
use dashmap::DashMap;
use rusqlite::Connection;
use tracing::{debug, info, instrument, warn};

use crate::db;
use crate::error::Result;
use crate::state::State;
use crate::types::Session;

/// Shared handle to one session. Holding the lock serialises that
/// principal's messages.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Cleanup hook run when a principal is removed, for subsystems that keep
/// their own per-principal data (e.g. company membership).
pub trait Remover: Send + Sync {
    fn remove(&self, id: &PrincipalId);
}

impl<F> Remover for F
where
    F: Fn(&PrincipalId) + Send + Sync,
{
    fn remove(&self, id: &PrincipalId) {
        self(id)
    }
}

/// Owns every session, keyed by principal id, with a unique secondary name.
///
/// Lookups go through a concurrent map. Structural changes (insert, remove,
/// name claims) additionally take the name-index lock, which makes the
/// id-and-name uniqueness check and the insert one atomic step.
///
/// None of the operations lock a session, so they are safe to call from a
/// state action while the caller's own session is locked. The exceptions
/// are [`save_sessions`](Self::save_sessions) and
/// [`with_session`](Self::with_session).
pub struct SessionRegistry {
    sessions: DashMap<PrincipalId, SessionHandle>,
    /// name -> owner. Also the lock for structural mutation.
    names: Mutex<HashMap<String, PrincipalId>>,
    removers: RwLock<Vec<Arc<dyn Remover>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            names: Mutex::new(HashMap::new()),
            removers: RwLock::new(Vec::new()),
        }
    }

    fn lock_names(&self) -> MutexGuard<'_, HashMap<String, PrincipalId>> {
        self.names.lock().expect("session name index poisoned")
    }

    pub fn get_by_id(&self, id: &PrincipalId) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// True while `id` has a session. Removal clears this before cleanup runs.
    pub fn contains(&self, id: &PrincipalId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<SessionHandle> {
        let names = self.lock_names();
        let id = names.get(name)?;
        self.get_by_id(id)
    }

    /// Register a new principal.
    ///
    /// Returns `None` if a session with the same id, or another session with
    /// the same non-empty name, already exists.
    #[instrument(skip(self, data, state), fields(principal = %id))]
    pub fn new_user(&self, id: PrincipalId, data: UserData, state: State) -> Option<SessionHandle> {
        let mut names = self.lock_names();
        if self.sessions.contains_key(&id) {
            debug!("principal already has a session");
            return None;
        }
        if !data.name.is_empty() {
            if names.contains_key(&data.name) {
                debug!(name = %data.name, "name already taken");
                return None;
            }
            names.insert(data.name.clone(), id.clone());
        }

        let handle = Arc::new(Mutex::new(Session::new(id.clone(), data, state)));
        self.sessions.insert(id, Arc::clone(&handle));
        info!("session created");
        Some(handle)
    }

    /// Reserve `name` for the existing session `id`, releasing any name it
    /// held before. Returns `false` if the name belongs to someone else, is
    /// empty, or `id` has no session.
    ///
    /// Callers still store the name in the session's [`UserData`]; the
    /// registry only guarantees nobody else can claim it.
    #[instrument(skip(self), fields(principal = %id))]
    pub fn claim_name(&self, id: &PrincipalId, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let mut names = self.lock_names();
        match names.get(name) {
            Some(owner) => return owner == id,
            None if !self.sessions.contains_key(id) => return false,
            None => {}
        }
        names.retain(|_, owner| owner != id);
        names.insert(name.to_string(), id.clone());
        debug!(name, "name claimed");
        true
    }

    /// Remove a principal's session.
    ///
    /// The session and its name leave the registry first, under the
    /// structural lock, so no name can be claimed for the principal once
    /// removal began. Every registered remover then runs once, and the
    /// detached session is dropped last. Returns whether a session existed;
    /// removers only run when one did.
    #[instrument(skip(self), fields(principal = %id))]
    pub fn remove_user(&self, id: &PrincipalId) -> bool {
        let detached = {
            let mut names = self.lock_names();
            let Some((_, handle)) = self.sessions.remove(id) else {
                debug!("no session to remove");
                return false;
            };
            names.retain(|_, owner| owner != id);
            handle
        };

        let removers = self
            .removers
            .read()
            .expect("remover list poisoned")
            .clone();
        for remover in &removers {
            remover.remove(id);
        }
        drop(detached);
        info!(removers = removers.len(), "session removed");
        true
    }

    /// Register a cleanup hook. Adding the same `Arc` twice is a no-op;
    /// returns whether it was added.
    pub fn add_remover(&self, remover: Arc<dyn Remover>) -> bool {
        let mut removers = self.removers.write().expect("remover list poisoned");
        if removers.iter().any(|r| Arc::ptr_eq(r, &remover)) {
            return false;
        }
        removers.push(remover);
        debug!(count = removers.len(), "remover registered");
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Every principal id, sorted.
    pub fn ids(&self) -> Vec<PrincipalId> {
        let mut ids: Vec<_> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Every principal id with its claimed name, sorted by id.
    pub fn directory(&self) -> Vec<(PrincipalId, Option<String>)> {
        let names = self.lock_names();
        let by_owner: HashMap<&PrincipalId, &String> =
            names.iter().map(|(name, owner)| (owner, name)).collect();
        self.ids()
            .into_iter()
            .map(|id| {
                let name = by_owner.get(&id).map(|n| n.to_string());
                (id, name)
            })
            .collect()
    }

    /// Run `f` with the session locked.
    pub fn with_session<R>(&self, id: &PrincipalId, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let handle = self.get_by_id(id)?;
        let mut session = handle.lock().expect("session poisoned");
        Some(f(&mut session))
    }

    /// Write every session's record to the SQLite database at `path`,
    /// replacing what was stored before. Returns the number of sessions.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save_sessions(&self, path: impl AsRef<Path>) -> Result<usize> {
        let handles: Vec<SessionHandle> =
            self.sessions.iter().map(|e| Arc::clone(e.value())).collect();
        let records: Vec<_> = handles
            .iter()
            .map(|h| h.lock().expect("session poisoned").record())
            .collect();

        let mut conn = Connection::open(path)?;
        db::init_db(&conn)?;
        db::write_records(&mut conn, &records)?;
        info!(count = records.len(), "sessions saved");
        Ok(records.len())
    }

    /// Replace every session with the ones stored at `path`.
    ///
    /// States are not stored; `restore` rebuilds each one from the
    /// principal's record. Rows whose name is already taken by an earlier
    /// row are skipped.
    #[instrument(skip(self, path, restore), fields(path = %path.as_ref().display()))]
    pub fn load_sessions(
        &self,
        path: impl AsRef<Path>,
        restore: impl Fn(&PrincipalId, &UserData) -> State,
    ) -> Result<usize> {
        let conn = Connection::open(path)?;
        db::init_db(&conn)?;
        let records = db::read_records(&conn)?;

        let mut names = self.lock_names();
        self.sessions.clear();
        names.clear();
        for record in records {
            if !record.data.name.is_empty() {
                if names.contains_key(&record.data.name) {
                    warn!(principal = %record.id, name = %record.data.name, "duplicate name in store, skipping");
                    continue;
                }
                names.insert(record.data.name.clone(), record.id.clone());
            }
            let state = restore(&record.id, &record.data);
            let session = Session::from_record(record, state);
            self.sessions
                .insert(session.id().clone(), Arc::new(Mutex::new(session)));
        }
        info!(count = self.sessions.len(), "sessions loaded");
        Ok(self.sessions.len())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use chatflow_core::Role;

    use super::*;
    use crate::menu::MenuState;
    use crate::state::Transition;

    fn home() -> State {
        MenuState::new("Home").into()
    }

    fn named(name: &str) -> UserData {
        UserData {
            name: name.to_string(),
            ..UserData::default()
        }
    }

    #[test]
    fn same_id_is_registered_once() {
        let registry = SessionRegistry::new();
        let a = PrincipalId::new("A");
        assert!(registry.new_user(a.clone(), UserData::default(), home()).is_some());
        assert!(registry.new_user(a.clone(), UserData::default(), home()).is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.get_by_id(&a).is_some());
    }

    #[test]
    fn concurrent_registration_has_one_winner() {
        let registry = Arc::new(SessionRegistry::new());
        let winners = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    if registry
                        .new_user(PrincipalId::new("A"), UserData::default(), home())
                        .is_some()
                    {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_are_unique_but_empty_names_are_not() {
        let registry = SessionRegistry::new();
        assert!(registry.new_user("1".into(), named("ana"), home()).is_some());
        assert!(registry.new_user("2".into(), named("ana"), home()).is_none());
        assert!(registry.new_user("3".into(), UserData::default(), home()).is_some());
        assert!(registry.new_user("4".into(), UserData::default(), home()).is_some());

        let found = registry.get_by_name("ana").unwrap();
        assert_eq!(found.lock().unwrap().id().as_str(), "1");
        assert!(registry.get_by_name("bob").is_none());
    }

    #[test]
    fn claim_name_moves_and_guards_names() {
        let registry = SessionRegistry::new();
        let one = PrincipalId::new("1");
        let two = PrincipalId::new("2");
        registry.new_user(one.clone(), UserData::default(), home());
        registry.new_user(two.clone(), UserData::default(), home());

        assert!(registry.claim_name(&one, "ana"));
        assert!(registry.claim_name(&one, "ana"));
        assert!(!registry.claim_name(&two, "ana"));
        assert!(registry.claim_name(&one, "ana maría"));
        // The old name was released.
        assert!(registry.claim_name(&two, "ana"));
        assert!(!registry.claim_name(&PrincipalId::new("ghost"), "casper"));
        assert!(!registry.claim_name(&one, ""));

        assert_eq!(
            registry.directory(),
            vec![
                (one, Some("ana maría".to_string())),
                (two, Some("ana".to_string()))
            ]
        );
    }

    #[test]
    fn removal_runs_each_remover_once() {
        let registry = Arc::new(SessionRegistry::new());
        let id = PrincipalId::new("7");
        registry.new_user(id.clone(), named("ana"), home());

        let calls = Arc::new(AtomicUsize::new(0));
        let remover: Arc<dyn Remover> = {
            let calls = Arc::clone(&calls);
            Arc::new(move |_: &PrincipalId| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        assert!(registry.add_remover(Arc::clone(&remover)));
        assert!(!registry.add_remover(remover));

        assert!(registry.remove_user(&id));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.get_by_id(&id).is_none());
        assert!(registry.get_by_name("ana").is_none());

        // Nothing left to clean up the second time.
        assert!(!registry.remove_user(&id));
        assert!(!registry.remove_user(&"never-registered".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removed_principal_cannot_claim_names_while_cleanup_runs() {
        let registry = Arc::new(SessionRegistry::new());
        let id = PrincipalId::new("7");
        registry.new_user(id.clone(), named("ana"), home());

        let checked = Arc::new(AtomicUsize::new(0));
        let remover: Arc<dyn Remover> = {
            let checked = Arc::clone(&checked);
            let registry = Arc::downgrade(&registry);
            Arc::new(move |removed: &PrincipalId| {
                let registry = registry.upgrade().unwrap();
                assert!(!registry.contains(removed));
                assert!(!registry.claim_name(removed, "late"));
                assert!(registry.get_by_name("ana").is_none());
                checked.fetch_add(1, Ordering::SeqCst);
            })
        };
        registry.add_remover(remover);

        assert!(registry.remove_user(&id));
        assert_eq!(checked.load(Ordering::SeqCst), 1);
        assert!(registry.get_by_name("late").is_none());
        // The released name is free for others.
        assert!(registry.new_user("8".into(), named("ana"), home()).is_some());
    }

    #[test]
    fn with_session_runs_under_the_lock() {
        let registry = SessionRegistry::new();
        let id = PrincipalId::new("9");
        let menu = MenuState::new("Home").command("/role", "Show role", |ctx| {
            Transition::stay().with_notice(ctx.data.role.to_string())
        });
        registry.new_user(id.clone(), UserData::with_role(Role::Admin), menu.into());

        let reply = registry.with_session(&id, |s| s.process_message("/role"));
        assert_eq!(reply.as_deref(), Some("admin\nHome\n        /role: Show role"));
        assert!(registry.with_session(&"nobody".into(), |_| ()).is_none());
    }

    #[test]
    fn sessions_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");

        let registry = SessionRegistry::new();
        registry.new_user("1".into(), named("ana"), home());
        registry.new_user("2".into(), UserData::with_role(Role::Admin), home());
        assert_eq!(registry.save_sessions(&path).unwrap(), 2);

        let restored = SessionRegistry::new();
        restored.new_user("stale".into(), UserData::default(), home());
        let count = restored
            .load_sessions(&path, |_, data| {
                MenuState::new(format!("Welcome back, {}", data.role)).into()
            })
            .unwrap();

        assert_eq!(count, 2);
        assert!(restored.get_by_id(&"stale".into()).is_none());
        let ana = restored.get_by_name("ana").unwrap();
        assert_eq!(ana.lock().unwrap().default_response(), "Welcome back, entrepreneur");
        let admin = restored.get_by_id(&"2".into()).unwrap();
        assert_eq!(admin.lock().unwrap().data.role, Role::Admin);
    }

    #[test]
    fn saving_twice_replaces_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");

        let registry = SessionRegistry::new();
        registry.new_user("1".into(), UserData::default(), home());
        registry.save_sessions(&path).unwrap();
        registry.remove_user(&"1".into());
        registry.new_user("2".into(), UserData::default(), home());
        registry.save_sessions(&path).unwrap();

        let restored = SessionRegistry::new();
        restored.load_sessions(&path, |_, _| home()).unwrap();
        assert_eq!(restored.ids(), vec![PrincipalId::new("2")]);
    }
}
