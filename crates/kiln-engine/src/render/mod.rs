//! GPU rendering subsystem.
//!
//! Each primitive renderer owns its GPU resources (pipelines, buffers) and
//! creates them on first use. Draws are immediate: one render pass, submitted
//! before the call returns, so draws land in program order.
//!
//! Convention:
//! - CPU geometry is in physical pixels (top-left origin, +Y down).
//! - NDC conversion happens on the CPU for paths and in the vertex stage for quads.

mod ctx;
pub mod primitives;
pub mod shader;

pub use ctx::{RenderCtx, RenderTarget};
pub use primitives::{PrimitiveKind, Primitives};
pub use shader::ShaderLibrary;
