/// Supplies the scene's combined view-projection matrix (column-major).
///
/// Queried at setup and again whenever the target extent changes.
pub trait TransformProvider {
    fn view_projection(&self, aspect: f32) -> [[f32; 4]; 4];
}

impl<F> TransformProvider for F
where
    F: Fn(f32) -> [[f32; 4]; 4],
{
    fn view_projection(&self, aspect: f32) -> [[f32; 4]; 4] {
        self(aspect)
    }
}

/// Positions are already in clip space.
#[derive(Debug, Copy, Clone, Default)]
pub struct IdentityTransform;

impl TransformProvider for IdentityTransform {
    fn view_projection(&self, _aspect: f32) -> [[f32; 4]; 4] {
        [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }
}
