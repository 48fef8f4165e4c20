//! 世界修改包装场景：应用修改后立即完成

use tracing::debug;

use super::{EventScene, EventfulScene, Scene, TickContext};
use crate::error::RuntimeError;
use crate::event::{EventResult, WorldUpdate};
use crate::state::GameState;
use crate::time::Millisecond;

#[derive(Debug)]
pub struct UpdateFromEvent {
    parent: EventfulScene,
    update: WorldUpdate,
}

impl UpdateFromEvent {
    pub fn new(parent: EventfulScene, update: WorldUpdate) -> Self {
        Self { parent, update }
    }
}

/// 把修改应用到场景与游戏状态
fn apply(
    scene: &mut EventfulScene,
    state: &mut GameState,
    update: WorldUpdate,
) -> Result<(), RuntimeError> {
    match update {
        WorldUpdate::Player(player) => scene.replace_player(player),
        WorldUpdate::Npc(npc) => scene.replace_npc(npc)?,
        WorldUpdate::SetVariable { name, value } => {
            debug!(name = %name, ?value, "设置变量");
            state.set_var(name, value);
        }
        WorldUpdate::SetVisible { name, visible } => {
            scene.character_mut(&name)?.visible = visible;
        }
    }
    Ok(())
}

impl EventScene for UpdateFromEvent {
    fn parent(&self) -> &EventfulScene {
        &self.parent
    }

    fn into_parent(self: Box<Self>) -> EventfulScene {
        self.parent
    }

    fn tick(
        self: Box<Self>,
        delta: Millisecond,
        ctx: &mut TickContext<'_>,
    ) -> Result<Scene, RuntimeError> {
        let this = *self;
        let mut parent = this.parent.tick_without_event(delta, ctx.config, ctx.state);
        apply(&mut parent, ctx.state, this.update)?;
        Ok(Scene::Eventful(parent.complete(EventResult::None, None)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::demo_scene;
    use crate::state::VarValue;

    #[test]
    fn test_apply_updates() {
        let mut scene = demo_scene();
        let mut state = GameState::new();

        apply(
            &mut scene,
            &mut state,
            WorldUpdate::SetVariable {
                name: "met_guard".to_string(),
                value: VarValue::Bool(true),
            },
        )
        .unwrap();
        assert!(state.is_set("met_guard"));

        apply(
            &mut scene,
            &mut state,
            WorldUpdate::SetVisible {
                name: "guard".to_string(),
                visible: false,
            },
        )
        .unwrap();
        assert!(!scene.npc("guard").unwrap().character.visible);

        let mut moved = scene.player().clone();
        moved.character.rect = moved.character.rect.translate((5.0, 0.0).into());
        apply(&mut scene, &mut state, WorldUpdate::Player(moved.clone())).unwrap();
        assert_eq!(scene.player().rect(), moved.rect());
    }

    #[test]
    fn test_unknown_character_fails() {
        let mut scene = demo_scene();
        let mut state = GameState::new();
        let result = apply(
            &mut scene,
            &mut state,
            WorldUpdate::SetVisible {
                name: "ghost".to_string(),
                visible: true,
            },
        );
        assert!(matches!(
            result,
            Err(RuntimeError::CharacterNotFound { name }) if name == "ghost"
        ));
    }
}
