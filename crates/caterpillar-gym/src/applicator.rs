//! Action applicators for the crawl environment.

use bevy::prelude::*;

use caterpillar_core::components::LastAction;
use caterpillar_core::traits::ActionApplicator;
use caterpillar_core::types::Action;

/// Caches the action in [`LastAction`]; the gait system turns it into joint
/// targets and the effort penalty reads it.
pub struct LastActionApplicator;

impl ActionApplicator for LastActionApplicator {
    fn apply(&self, world: &mut World, action: &Action) {
        world.insert_resource(LastAction(action.as_slice().to_vec()));
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "LastActionApplicator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_replaces_last_action() {
        let mut world = World::new();
        world.insert_resource(LastAction(vec![0.0; 3]));
        LastActionApplicator.apply(&mut world, &Action::new(vec![0.1, 0.2, 0.3]));
        assert_eq!(world.resource::<LastAction>().0, vec![0.1, 0.2, 0.3]);
    }
}
