//! Conflict-releaser collaborator hook.
//!
//! Before a rotation starts, cross-assembly rigid links that would fight
//! the commanded motion must be released.  What those links are is the
//! host application's business; it registers releasers here and the
//! actuator invokes them from its start hook.

use bevy::prelude::*;

// ---------------------------------------------------------------------------
// ConflictReleaser
// ---------------------------------------------------------------------------

/// Releases rigid links that would resist a commanded rotation of `body`.
pub trait ConflictReleaser: Send + Sync + 'static {
    /// Release any conflicting links for the given driving body.
    fn release(&self, world: &mut World, body: Entity);

    /// Human-readable name for this releaser.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// ConflictReleasers
// ---------------------------------------------------------------------------

/// Registered conflict releasers, invoked in registration order.
#[derive(Resource, Default)]
pub struct ConflictReleasers {
    releasers: Vec<Box<dyn ConflictReleaser>>,
}

impl ConflictReleasers {
    /// Register a releaser.
    pub fn register(&mut self, releaser: Box<dyn ConflictReleaser>) {
        self.releasers.push(releaser);
    }

    /// Number of registered releasers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.releasers.len()
    }

    /// Whether no releasers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releasers.is_empty()
    }

    /// Invoke every releaser for `body`.
    pub fn release_all(&self, world: &mut World, body: Entity) {
        for releaser in &self.releasers {
            releaser.release(world, body);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Resource, Default)]
    struct ReleaseLog(Vec<Entity>);

    struct LoggingReleaser;

    impl ConflictReleaser for LoggingReleaser {
        fn release(&self, world: &mut World, body: Entity) {
            world.resource_mut::<ReleaseLog>().0.push(body);
        }

        #[allow(clippy::unnecessary_literal_bound)]
        fn name(&self) -> &str {
            "LoggingReleaser"
        }
    }

    #[test]
    fn trait_is_object_safe() {
        fn _accepts_boxed(_: Box<dyn ConflictReleaser>) {}
    }

    #[test]
    fn release_all_invokes_each_releaser() {
        let mut world = World::new();
        world.init_resource::<ReleaseLog>();
        let body = world.spawn_empty().id();

        let mut releasers = ConflictReleasers::default();
        releasers.register(Box::new(LoggingReleaser));
        releasers.register(Box::new(LoggingReleaser));
        assert_eq!(releasers.len(), 2);

        releasers.release_all(&mut world, body);
        assert_eq!(world.resource::<ReleaseLog>().0, vec![body, body]);
    }

    #[test]
    fn empty_registry_is_a_noop() {
        let mut world = World::new();
        let body = world.spawn_empty().id();
        let releasers = ConflictReleasers::default();
        assert!(releasers.is_empty());
        releasers.release_all(&mut world, body);
    }
}
