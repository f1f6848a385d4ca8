use crate::{Phase, Surface};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub banner: Option<String>,
    pub status: String,
    pub surface: Surface,
    pub last_id: Option<i64>,
    pub dirty: bool,
}
