//! The injected two-view transform contract.

use crate::error::TransformError;
use crate::image::ChwImage;

/// Produces two independently transformed views of one canonical image.
///
/// This is the seam between sample access and the augmentation pipeline:
/// the dataset invokes it once per paired access and stacks whatever comes
/// back. Both views must share one shape; how they are produced — random
/// crops, color jitter, nothing at all — is entirely the implementor's
/// business.
///
/// Implementations must be `Send + Sync`; datasets are read from multiple
/// worker threads at once.
pub trait TwoViewTransform: Send + Sync {
    /// Produces both views of `image` in a single call.
    ///
    /// # Errors
    ///
    /// A failure aborts the single access that invoked the transform.
    fn two_views(&self, image: &ChwImage) -> Result<(ChwImage, ChwImage), TransformError>;
}

/// A transform whose views are both the unmodified input.
///
/// Useful for tests and for ablations that want the paired return shape
/// without augmentation.
///
/// # Example
///
/// ```
/// use pretrain_dataset::{ChwImage, IdentityViews, TwoViewTransform};
///
/// let image = ChwImage::new(1, 1, 2, vec![1.0, 2.0]).unwrap();
/// let (a, b) = IdentityViews.two_views(&image).unwrap();
/// assert_eq!(a, image);
/// assert_eq!(b, image);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityViews;

impl TwoViewTransform for IdentityViews {
    fn two_views(&self, image: &ChwImage) -> Result<(ChwImage, ChwImage), TransformError> {
        Ok((image.clone(), image.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_views_clone_input() {
        let image = ChwImage::new(2, 1, 1, vec![5.0, 6.0]).unwrap();
        let (a, b) = IdentityViews.two_views(&image).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.data, vec![5.0, 6.0]);
    }
}
