use skill_core::SkillContext;
use storage::Storage;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) skill: SkillContext,
    pub(crate) storage: Storage,
}
