//! Obtain-or-create registry for the user model
//!
//! A [`ModelRegistry`] holds at most one [`UserModel`]. The first call to
//! [`ModelRegistry::user_model`] builds and registers it; every later call,
//! from any thread, gets a clone of that same handle and never runs its
//! initializer. Because [`ModelRegistry::new`] is `const`, a registry can
//! live in a `static` for the whole process or be owned by a caller and
//! passed around explicitly.

use std::sync::OnceLock;
use tracing::info;

use crate::model::UserModel;
use crate::store::UserStore;

pub struct ModelRegistry<S> {
    user: OnceLock<UserModel<S>>,
}

impl<S> ModelRegistry<S> {
    pub const fn new() -> Self {
        Self {
            user: OnceLock::new(),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.user.get().is_some()
    }

    /// The registered handle, without creating one
    pub fn get_user_model(&self) -> Option<UserModel<S>> {
        self.user.get().cloned()
    }
}

impl<S: UserStore> ModelRegistry<S> {
    /// Return the registered user model, registering one built on the store
    /// returned by `init` if none exists yet.
    ///
    /// Idempotent: `init` runs at most once per registry, including under
    /// concurrent first calls, and all callers receive handles for which
    /// [`UserModel::same_handle`] holds.
    pub fn user_model<F>(&self, init: F) -> UserModel<S>
    where
        F: FnOnce() -> S,
    {
        self.user
            .get_or_init(|| {
                let model = UserModel::new(init());
                info!("Registered model {}", model.shape().name);
                model
            })
            .clone()
    }
}

impl<S> Default for ModelRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
