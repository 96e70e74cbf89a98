/// One acquired surface image.
///
/// Short-lived: holding it prevents acquisition of the next image. Dropping it
/// without `present` discards the frame.
pub struct SurfaceFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl SurfaceFrame {
    /// Queues the image for presentation.
    pub fn present(self) {
        drop(self.view);
        self.surface_texture.present();
    }
}
