use super::actor::ActorRegistry;

pub trait LevelBuilder {
    fn setup_scene(&mut self, level: u32, actors: &mut ActorRegistry);
}
