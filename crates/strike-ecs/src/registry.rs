//! The component registry shared by every system.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entity::{Entity, EntityAllocator};
use crate::pool::SparseSet;

/// Marker for types storable in the registry.
pub trait Component: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Component for T {}

/// Type-erased view of a pool: enough to purge an entity without knowing the
/// component type. This is how `destroy` reaches every pool.
trait AnyPool: Send + Sync {
    fn remove_for(&self, entity: Entity);
    fn as_any(&self) -> &dyn Any;
}

struct Pool<T: Component> {
    cells: RwLock<SparseSet<T>>,
}

impl<T: Component> Pool<T> {
    fn new() -> Self {
        Self {
            cells: RwLock::new(SparseSet::new()),
        }
    }
}

impl<T: Component> AnyPool for Pool<T> {
    fn remove_for(&self, entity: Entity) {
        relock(self.cells.write()).remove(entity);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// A poisoned lock means a system panicked mid-tick; the run is already lost,
// so recover the guard and let teardown proceed instead of deadlocking.
fn relock<G>(result: Result<G, PoisonError<G>>) -> G {
    result.unwrap_or_else(PoisonError::into_inner)
}

/// Typed component store keyed by generational entity handles.
///
/// Every component kind lives in its own [`SparseSet`] behind a reader-writer
/// lock, so concurrent systems partition the registry by component, not by
/// entity. All pools must be registered (with [`Registry::register`]) before
/// the registry is shared across threads; the pool table itself is immutable
/// afterwards.
///
/// Structural operations (`create`, `destroy`, `add`, `remove`) take `&self`
/// and synchronize internally, which lets systems running as jobs spawn
/// decoys or destroy entities. A system must not call `destroy` while it
/// holds pool guards; collect victims first, drop the guards, then destroy.
pub struct Registry {
    entities: Mutex<EntityAllocator>,
    pools: HashMap<TypeId, Box<dyn AnyPool>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entities: Mutex::new(EntityAllocator::new()),
            pools: HashMap::new(),
        }
    }

    /// Registers a pool for `T`. Idempotent. Must happen before the registry
    /// is shared with worker threads.
    pub fn register<T: Component>(&mut self) {
        self.pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Pool::<T>::new()));
    }

    /// Creates a live entity, reusing freed indices with a bumped generation.
    pub fn create(&self) -> Entity {
        relock(self.entities.lock()).allocate()
    }

    /// Destroys an entity, purging it from every pool. No-op on stale
    /// handles.
    pub fn destroy(&self, entity: Entity) {
        if !relock(self.entities.lock()).deallocate(entity) {
            return;
        }
        for pool in self.pools.values() {
            pool.remove_for(entity);
        }
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        relock(self.entities.lock()).is_alive(entity)
    }

    pub fn live_count(&self) -> usize {
        relock(self.entities.lock()).live_count()
    }

    /// Attaches a component to a live entity.
    pub fn add<T: Component>(&self, entity: Entity, value: T) {
        debug_assert!(self.is_alive(entity), "add on dead entity {entity:?}");
        self.write::<T>().insert(entity, value);
    }

    /// Detaches `T` from the entity, returning it if present.
    pub fn remove<T: Component>(&self, entity: Entity) -> Option<T> {
        self.write::<T>().remove(entity)
    }

    /// True iff the entity is bound in `T`'s pool. False when the pool was
    /// never registered.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        match self.pools.get(&TypeId::of::<T>()) {
            Some(pool) => pool.contains_probe::<T>(entity),
            None => false,
        }
    }

    /// Shared guard over `T`'s pool.
    ///
    /// Panics if `T` was never registered; that is a wiring error, not a
    /// runtime condition.
    pub fn read<T: Component>(&self) -> RwLockReadGuard<'_, SparseSet<T>> {
        relock(self.pool::<T>().cells.read())
    }

    /// Exclusive guard over `T`'s pool.
    pub fn write<T: Component>(&self) -> RwLockWriteGuard<'_, SparseSet<T>> {
        relock(self.pool::<T>().cells.write())
    }

    fn pool<T: Component>(&self) -> &Pool<T> {
        self.pools
            .get(&TypeId::of::<T>())
            .unwrap_or_else(|| panic!("component pool not registered: {}", type_name::<T>()))
            .as_any()
            .downcast_ref::<Pool<T>>()
            .unwrap_or_else(|| panic!("pool type confusion for {}", type_name::<T>()))
    }
}

// `has` needs a typed probe through the erased pool; doing it on the trait
// object avoids a second map lookup.
impl dyn AnyPool {
    fn contains_probe<T: Component>(&self, entity: Entity) -> bool {
        self.as_any()
            .downcast_ref::<Pool<T>>()
            .is_some_and(|pool| relock(pool.cells.read()).contains(entity))
    }
}

macro_rules! impl_view {
    ($name:ident; $($ty:ident, $val:ident, $guard:ident);+) => {
        impl Registry {
            /// Calls `f` for every live entity bearing all listed
            /// components. Pools are locked exclusively for the duration, in
            /// argument order; callers list components in the canonical
            /// component-table order to keep lock acquisition consistent.
            pub fn $name<Lead: Component, $($ty: Component),+>(
                &self,
                mut f: impl FnMut(Entity, &mut Lead, $(&mut $ty),+),
            ) {
                let mut lead = self.write::<Lead>();
                $(let mut $guard = self.write::<$ty>();)+
                for i in 0..lead.len() {
                    let entity = lead.entity_at(i);
                    $(let Some($val) = $guard.get_mut(entity) else { continue };)+
                    f(entity, lead.value_at_mut(i), $($val),+);
                }
            }
        }
    };
}

impl_view!(view2; B, vb, gb);
impl_view!(view3; B, vb, gb; C, vc, gc);
impl_view!(view4; B, vb, gb; C, vc, gc; D, vd, gd);
impl_view!(view5; B, vb, gb; C, vc, gc; D, vd, gd; E, ve, ge);
