//! Application service container.
//!
//! Services are registered once at startup as `Arc<T>` and resolved by type, where
//! `T` may be a trait object such as `dyn EntitySet<Customer>`. A service can also
//! be registered under a name, so several implementations of the same interface
//! live side by side (e.g. the `"billing"` and `"shipping"` address views).
//!
//! Key = (type name, optional name). `type_name::<T>()` works for `T = dyn Trait`.
//! Re-registering overwrites the previous value; `Arc`s already handed out stay valid.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TypeKey(&'static str);

impl TypeKey {
    fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(std::any::type_name::<T>())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service not registered: type={type_key}, name={name:?}")]
    NotFound {
        type_key: TypeKey,
        name: Option<String>,
    },

    #[error("service type mismatch: type={type_key}, name={name:?}")]
    TypeMismatch {
        type_key: TypeKey,
        name: Option<String>,
    },
}

type Boxed = Box<dyn Any + Send + Sync>;

type ServiceMap = HashMap<(TypeKey, Option<String>), Boxed>;

/// Type-keyed registry of shared services.
pub struct ServiceCollection {
    map: RwLock<ServiceMap>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    /// Register `service` as the default implementation of `T`.
    pub fn register<T>(&self, service: Arc<T>) -> &Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert::<T>(None, service)
    }

    /// Register `service` as the implementation of `T` called `name`.
    pub fn register_named<T>(&self, name: impl Into<String>, service: Arc<T>) -> &Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert::<T>(Some(name.into()), service)
    }

    fn insert<T>(&self, name: Option<String>, service: Arc<T>) -> &Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map
            .write()
            .insert((TypeKey::of::<T>(), name), Box::new(service));
        self
    }

    pub fn get<T>(&self) -> Result<Arc<T>, ServiceError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.lookup::<T>(None)
    }

    pub fn get_named<T>(&self, name: &str) -> Result<Arc<T>, ServiceError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.lookup::<T>(Some(name.to_string()))
    }

    fn lookup<T>(&self, name: Option<String>) -> Result<Arc<T>, ServiceError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_key = TypeKey::of::<T>();
        let map = self.map.read();

        let boxed = map
            .get(&(type_key.clone(), name.clone()))
            .ok_or_else(|| ServiceError::NotFound {
                type_key: type_key.clone(),
                name: name.clone(),
            })?;

        boxed
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(ServiceError::TypeMismatch { type_key, name })
    }

    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map.read().contains_key(&(TypeKey::of::<T>(), None))
    }

    pub fn contains_named<T>(&self, name: &str) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map
            .read()
            .contains_key(&(TypeKey::of::<T>(), Some(name.to_string())))
    }

    /// Remove the default registration of `T`, returning it if present.
    pub fn remove<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let boxed = self.map.write().remove(&(TypeKey::of::<T>(), None))?;
        boxed.downcast::<Arc<T>>().ok().map(|b| *b)
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.map.read();
        let mut keys: Vec<_> = map.keys().collect();
        keys.sort_by(|a, b| (a.0.0, &a.1).cmp(&(b.0.0, &b.1)));
        f.debug_struct("ServiceCollection")
            .field("services", &keys)
            .finish()
    }
}
