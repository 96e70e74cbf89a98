use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::TextureId;

/// Number of addressable texture units.
pub const MAX_TEXTURE_UNITS: u32 = 32;

/// What a texture unit currently points at.
#[derive(Debug, Clone)]
pub(crate) struct BoundTexture {
    pub id: TextureId,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Per-context texture-unit table.
///
/// wgpu has no global binding state, so the "currently bound texture" of each
/// unit is kept here and turned into a bind group by the primitive that reads it.
#[derive(Debug, Default)]
pub(crate) struct TextureUnits {
    slots: Mutex<HashMap<u32, BoundTexture>>,
}

impl TextureUnits {
    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<u32, BoundTexture>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn bind(&self, unit: u32, texture: BoundTexture) {
        self.slots().insert(unit, texture);
    }

    /// Returns whether anything was bound.
    pub fn unbind(&self, unit: u32) -> bool {
        self.slots().remove(&unit).is_some()
    }

    pub fn get(&self, unit: u32) -> Option<BoundTexture> {
        self.slots().get(&unit).cloned()
    }

    /// Unbinds `id` from every unit.
    pub fn unbind_id(&self, id: TextureId) {
        self.slots().retain(|_, bound| bound.id != id);
    }

    /// Points every unit holding `id` at a new view (after reallocation).
    pub fn replace_view(&self, id: TextureId, view: &wgpu::TextureView) {
        for bound in self.slots().values_mut().filter(|b| b.id == id) {
            bound.view = view.clone();
        }
    }

    /// Updates the sampler of every unit holding `id` (after a filter/wrap change).
    pub fn replace_sampler(&self, id: TextureId, sampler: &wgpu::Sampler) {
        for bound in self.slots().values_mut().filter(|b| b.id == id) {
            bound.sampler = sampler.clone();
        }
    }
}
